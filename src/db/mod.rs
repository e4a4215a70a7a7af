use std::str::FromStr;

use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

pub async fn init_db(database_url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    migrate(&pool).await?;

    Ok(pool)
}

/// Single-connection in-memory database; every connection to `:memory:`
/// would otherwise see its own empty database.
#[cfg(test)]
pub async fn memory_db() -> SqlitePool {
    init_db("sqlite::memory:", 1)
        .await
        .expect("in-memory sqlite")
}

/// Inserts a bare recipe whose `created_at` is `order` seconds after a fixed
/// epoch, so callers control listing order.
#[cfg(test)]
pub async fn seed_recipe(pool: &SqlitePool, id: &str, title: &str, meal_type: Option<&str>, order: i64) {
    use chrono::{Duration, TimeZone, Utc};

    let created_at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap() + Duration::seconds(order);
    sqlx::query(
        "INSERT INTO recipes (id, title, ready_in_minutes, servings, meal_type, created_at, updated_at) VALUES (?, ?, 20, 2, ?, ?, ?)",
    )
    .bind(id)
    .bind(title)
    .bind(meal_type)
    .bind(created_at)
    .bind(created_at)
    .execute(pool)
    .await
    .expect("seed recipe");
}

#[cfg(test)]
pub async fn seed_ingredient(pool: &SqlitePool, recipe_id: &str, name: &str, order_index: i64) {
    sqlx::query(
        "INSERT INTO ingredients (id, recipe_id, name, amount, unit, original, order_index) VALUES (?, ?, ?, 1.0, 'cup', ?, ?)",
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(recipe_id)
    .bind(name)
    .bind(format!("1 cup {name}"))
    .bind(order_index)
    .execute(pool)
    .await
    .expect("seed ingredient");
}

#[cfg(test)]
pub async fn seed_instruction(
    pool: &SqlitePool,
    recipe_id: &str,
    step_number: i64,
    step_text: &str,
    group: Option<&str>,
) {
    sqlx::query(
        "INSERT INTO instructions (id, recipe_id, step_number, step_text, instruction_group) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(recipe_id)
    .bind(step_number)
    .bind(step_text)
    .bind(group)
    .execute(pool)
    .await
    .expect("seed instruction");
}

async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS recipes (
            id TEXT PRIMARY KEY,
            user_id TEXT,
            title TEXT NOT NULL,
            summary TEXT,
            ready_in_minutes INTEGER NOT NULL DEFAULT 0,
            servings INTEGER NOT NULL DEFAULT 1,
            image_url TEXT,
            meal_type TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            aggregate_rating REAL,
            rating_count INTEGER
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS ingredients (
            id TEXT PRIMARY KEY,
            recipe_id TEXT NOT NULL,
            name TEXT NOT NULL,
            amount REAL,
            unit TEXT,
            original TEXT NOT NULL,
            order_index INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY (recipe_id) REFERENCES recipes(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS instructions (
            id TEXT PRIMARY KEY,
            recipe_id TEXT NOT NULL,
            step_number INTEGER NOT NULL,
            step_text TEXT NOT NULL,
            instruction_group TEXT,
            FOREIGN KEY (recipe_id) REFERENCES recipes(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    // parent_comment_id cascades so that deleting a reply's parent also
    // removes replies nested more than one level below it.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS recipe_comments (
            id TEXT PRIMARY KEY,
            recipe_id TEXT NOT NULL,
            parent_comment_id TEXT,
            author_name TEXT,
            comment_text TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY (recipe_id) REFERENCES recipes(id) ON DELETE CASCADE,
            FOREIGN KEY (parent_comment_id) REFERENCES recipe_comments(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_recipe_comments_recipe_created ON recipe_comments (recipe_id, created_at)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_recipe_comments_parent ON recipe_comments (parent_comment_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
