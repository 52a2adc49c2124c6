//! Catalog seeding command.
//!
//! The storefront never creates products itself - catalog management is an
//! external concern, and this command is that external tool for development
//! and demos. Re-running it is safe: rows are keyed by name and skipped when
//! already present.

use rust_decimal::Decimal;

use super::CommandError;

/// Sample catalog: (name, description, price in cents, stock).
const SAMPLE_PRODUCTS: &[(&str, &str, i64, i32)] = &[
    (
        "Gundam RX-78-2 model kit",
        "1/144 scale plastic model kit, grade HG",
        34_99,
        25,
    ),
    ("Totoro plush (medium)", "Soft grey plush, 30 cm", 24_50, 40),
    ("One Piece vol. 1", "Paperback, English edition", 9_99, 60),
    ("Akira theatrical poster", "Reprint, 61 x 91 cm", 14_00, 15),
    (
        "Evangelion EVA-01 figure",
        "Articulated action figure, 17 cm",
        54_90,
        10,
    ),
    (
        "Studio Ghibli sticker sheet",
        "20 die-cut vinyl stickers",
        4_75,
        120,
    ),
];

/// Insert the sample catalog.
///
/// # Errors
///
/// Returns `CommandError` if the database is unreachable or an insert fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = super::connect().await?;

    let mut inserted = 0_u64;
    for (name, description, cents, stock) in SAMPLE_PRODUCTS {
        let result = sqlx::query(
            r"
            INSERT INTO products (name, description, price, stock)
            SELECT $1, $2, $3, $4
            WHERE NOT EXISTS (SELECT 1 FROM products WHERE name = $1)
            ",
        )
        .bind(name)
        .bind(description)
        .bind(Decimal::new(*cents, 2))
        .bind(stock)
        .execute(&pool)
        .await?;

        inserted += result.rows_affected();
    }

    tracing::info!(inserted, "catalog seeded");
    Ok(())
}
