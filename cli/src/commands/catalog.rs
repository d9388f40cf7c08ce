use anyhow::{Result, bail};
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use larder_core::catalog::Catalog;
use larder_core::filter::filter_foods;

use super::helpers::{json_error, nutrient_rows, print_food_table, truncate};

pub(crate) fn cmd_categories(catalog: &Catalog, json: bool) -> Result<()> {
    #[derive(Tabled)]
    struct CategoryRow {
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Foods")]
        foods: usize,
        #[tabled(rename = "Description")]
        description: String,
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&catalog.categories)?);
        return Ok(());
    }

    if catalog.categories.is_empty() {
        eprintln!("No categories. Import a catalog with `larder import <file.json>`");
        process::exit(2);
    }

    let rows: Vec<CategoryRow> = catalog
        .categories
        .iter()
        .map(|c| CategoryRow {
            id: c.id.clone(),
            name: c.name.clone(),
            foods: catalog.foods.iter().filter(|f| f.category_id == c.id).count(),
            description: c
                .description
                .as_deref()
                .map(|d| truncate(d, 50))
                .unwrap_or_default(),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..3)).with(Alignment::right()))
        .to_string();
    println!("{table}");
    Ok(())
}

/// Resolve a `--category` argument: an exact id, else a case-insensitive name.
fn resolve_category<'a>(catalog: &'a Catalog, arg: &str) -> Result<&'a str> {
    if let Some(c) = catalog.category(arg) {
        return Ok(&c.id);
    }
    match catalog
        .categories
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(arg))
    {
        Some(c) => Ok(&c.id),
        None => bail!("Unknown category '{arg}'. Run `larder categories` to list them"),
    }
}

pub(crate) fn cmd_foods(
    catalog: &Catalog,
    category: Option<&str>,
    search: Option<&str>,
    json: bool,
) -> Result<()> {
    let category = category
        .filter(|c| !c.is_empty())
        .map(|c| resolve_category(catalog, c))
        .transpose()?;
    let foods = filter_foods(&catalog.foods, category, search.unwrap_or_default());

    if json {
        println!("{}", serde_json::to_string_pretty(&foods)?);
        return Ok(());
    }

    if foods.is_empty() {
        match search {
            Some(q) if !q.is_empty() => eprintln!("No foods match '{q}'"),
            _ => eprintln!("No foods found"),
        }
        process::exit(2);
    }

    print_food_table(&foods, catalog);
    Ok(())
}

pub(crate) fn cmd_food_show(catalog: &Catalog, id: &str, json: bool) -> Result<()> {
    let Some(food) = catalog.food(id) else {
        if json {
            println!("{}", json_error(&format!("Food {id} not found")));
            process::exit(1);
        }
        bail!("Food {id} not found");
    };

    if json {
        println!("{}", serde_json::to_string_pretty(food)?);
        return Ok(());
    }

    let category = catalog.category_name(food).unwrap_or("(unknown category)");
    println!("{} [{}]", food.name, food.id);
    println!("  Category: {category}");
    if let Some(desc) = &food.description {
        println!("  {desc}");
    }
    println!("  Serving size: {:.0}g", food.serving_size);
    if let Some(url) = &food.image_url {
        println!("  Image: {url}");
    }
    println!();
    for (label, value) in nutrient_rows(&food.nutrients) {
        println!("  {label:<10} {value:>12}");
    }
    Ok(())
}
