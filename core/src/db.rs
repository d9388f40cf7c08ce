use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use rusqlite::{Connection, params};
use uuid::Uuid;

use crate::models::{Food, FoodCategory, NewCategory, NewFood, Nutrients};

const FOOD_COLUMNS: &str = "id, category_id, name, description, serving_size, calories, protein, carbs, fat, fiber, sugar, sodium, potassium, vitamin_a, vitamin_c, calcium, iron, image_url";

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            // category_id is not a foreign key: imports may
            // carry a reference the catalog does not know about.
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS food_categories (
                    id TEXT PRIMARY KEY,
                    name TEXT NOT NULL,
                    description TEXT,
                    created_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS foods (
                    id TEXT PRIMARY KEY,
                    category_id TEXT NOT NULL,
                    name TEXT NOT NULL,
                    description TEXT,
                    serving_size REAL NOT NULL DEFAULT 0,
                    calories REAL NOT NULL DEFAULT 0,
                    protein REAL NOT NULL DEFAULT 0,
                    carbs REAL NOT NULL DEFAULT 0,
                    fat REAL NOT NULL DEFAULT 0,
                    fiber REAL NOT NULL DEFAULT 0,
                    sugar REAL NOT NULL DEFAULT 0,
                    sodium REAL NOT NULL DEFAULT 0,
                    potassium REAL NOT NULL DEFAULT 0,
                    vitamin_a REAL NOT NULL DEFAULT 0,
                    vitamin_c REAL NOT NULL DEFAULT 0,
                    calcium REAL NOT NULL DEFAULT 0,
                    iron REAL NOT NULL DEFAULT 0,
                    image_url TEXT,
                    created_at TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_foods_category ON foods(category_id);

                PRAGMA user_version = 1;",
            )?;
        }

        Ok(())
    }

    fn category_from_row(row: &rusqlite::Row) -> rusqlite::Result<FoodCategory> {
        Ok(FoodCategory {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
        })
    }

    // Expects the columns of FOOD_COLUMNS, in order.
    fn food_from_row(row: &rusqlite::Row) -> rusqlite::Result<Food> {
        Ok(Food {
            id: row.get(0)?,
            category_id: row.get(1)?,
            name: row.get(2)?,
            description: row.get(3)?,
            serving_size: row.get(4)?,
            nutrients: Nutrients {
                calories: row.get(5)?,
                protein: row.get(6)?,
                carbs: row.get(7)?,
                fat: row.get(8)?,
                fiber: row.get(9)?,
                sugar: row.get(10)?,
                sodium: row.get(11)?,
                potassium: row.get(12)?,
                vitamin_a: row.get(13)?,
                vitamin_c: row.get(14)?,
                calcium: row.get(15)?,
                iron: row.get(16)?,
            },
            image_url: row.get(17)?,
        })
    }

    // --- Categories ---

    pub fn list_categories(&self) -> Result<Vec<FoodCategory>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, description FROM food_categories ORDER BY rowid")?;
        let categories = stmt
            .query_map([], Self::category_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(categories)
    }

    pub fn insert_category(&self, category: &NewCategory) -> Result<FoodCategory> {
        let id = Uuid::new_v4().to_string();
        let now = Local::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO food_categories (id, name, description, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![id, category.name, category.description, now],
        )?;
        Ok(FoodCategory {
            id,
            name: category.name.clone(),
            description: category.description.clone(),
        })
    }

    // --- Foods ---

    pub fn list_foods(&self) -> Result<Vec<Food>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {FOOD_COLUMNS} FROM foods ORDER BY rowid"))?;
        let foods = stmt
            .query_map([], Self::food_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(foods)
    }

    /// Insert a batch of foods atomically: either every row lands or none.
    ///
    /// Returns the ids assigned to the new rows, in input order.
    pub fn insert_foods(&self, foods: &[NewFood]) -> Result<Vec<String>> {
        let tx = self.conn.unchecked_transaction()?;
        let now = Local::now().to_rfc3339();
        let mut ids = Vec::with_capacity(foods.len());
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO foods ({FOOD_COLUMNS}, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)"
            ))?;
            for food in foods {
                let id = Uuid::new_v4().to_string();
                let n = &food.nutrients;
                stmt.execute(params![
                    id,
                    food.category_id,
                    food.name,
                    food.description,
                    food.serving_size,
                    n.calories,
                    n.protein,
                    n.carbs,
                    n.fat,
                    n.fiber,
                    n.sugar,
                    n.sodium,
                    n.potassium,
                    n.vitamin_a,
                    n.vitamin_c,
                    n.calcium,
                    n.iron,
                    food.image_url,
                    now,
                ])?;
                ids.push(id);
            }
        }
        tx.commit()?;
        Ok(ids)
    }
}
