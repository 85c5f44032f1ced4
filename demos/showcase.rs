use anyhow::Context;
use chrono::{TimeZone, Utc};

use bazaar_db::Bazaar;
use bazaar_db::geo::GeoPoint;
use bazaar_db::model::{Category, Discount, Product, Review, Role, Subcategory, Transaction, User};
use bazaar_db::workflows::LoyaltyDiscount;

fn main() -> anyhow::Result<()> {
    println!("Starting bazaar-db showcase...");

    let db_path = std::path::Path::new("showcase_db");
    // Clean up from previous runs
    if db_path.exists() {
        std::fs::remove_dir_all(db_path)?;
    }

    let db = Bazaar::open(db_path).context("failed to open store")?;

    // 1. Users with validated fields and locations
    println!("\n=== 1. Users ===");
    let plaza = GeoPoint::new(-46.6333, -23.5505);
    let users = [
        ("Alice", 1, Role::Buyer, plaza.clone()),
        ("Bob", 2, Role::Buyer, GeoPoint::new(-46.6430, -23.5505)),
        ("Carla", 10, Role::Seller, GeoPoint::new(-46.70, -23.60)),
    ];
    for (name, id, role, location) in users {
        db.insert_user(&User {
            id,
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            address: "10 Market Lane".to_string(),
            password: "longenough".to_string(),
            location,
            role,
            loyalty_points: 0,
        })?;
        println!("Inserted user {name} (#{id})");
    }

    // A rejected write names the offending field.
    let invalid = User {
        id: 99,
        name: "Al".to_string(),
        email: "al@example.com".to_string(),
        address: "10 Market Lane".to_string(),
        password: "longenough".to_string(),
        location: plaza.clone(),
        role: Role::Buyer,
        loyalty_points: 0,
    };
    match db.insert_user(&invalid) {
        Err(e) => println!("Rejected as expected: {e}"),
        Ok(_) => anyhow::bail!("validation should have rejected the short name"),
    }

    // 2. The nested catalog
    println!("\n=== 2. Catalog ===");
    db.insert_category(&Category {
        name: "Electronics".to_string(),
        subcategories: vec![Subcategory {
            name: "Audio".to_string(),
            products: vec![
                Product {
                    id: 1,
                    name: "Headphones".to_string(),
                    description: "Over-ear wireless headphones".to_string(),
                    price: 120.0,
                    stock_quantity: 5,
                    location: Some(plaza.clone()),
                    discount: Discount::default(),
                },
                Product {
                    id: 2,
                    name: "Speaker".to_string(),
                    description: "Portable bluetooth speaker".to_string(),
                    price: 60.0,
                    stock_quantity: 8,
                    location: Some(GeoPoint::new(-46.6430, -23.5505)),
                    discount: Discount::default(),
                },
            ],
        }],
    })?;
    let flat = db.products_in_category("Electronics")?;
    println!("Electronics holds {} products", flat.len());

    // 3. Reviews and transactions
    println!("\n=== 3. Activity ===");
    for (user_id, product_id, rating) in [(1, 1, 5), (2, 1, 4), (1, 2, 3)] {
        db.insert_review(&Review {
            rating,
            comment: Some("solid".to_string()),
            user_id,
            product_id,
            seller_reply: None,
        })?;
    }
    for (id, user_id, product_id) in [(100u64, 1u64, 1u64), (101, 2, 1), (102, 1, 2)] {
        db.record_transaction(&Transaction {
            id,
            user_id,
            product_id,
            seller_id: 10,
        })?;
    }
    println!("Recorded {} transactions", db.transactions()?.len());

    // 4. Reports
    println!("\n=== 4. Reports ===");
    for row in db.average_rating_per_product()? {
        println!(
            "Product #{} ({}) averages {}",
            row.product_id, row.product_name, row.average_rating
        );
    }
    for row in db.sales_by_category()? {
        println!(
            "{}: {} sales, {} revenue",
            row.category, row.total_sales, row.revenue
        );
    }
    let csv = bazaar_db::export::csv_string(&db.spend_per_user()?)?;
    println!("Spend per user as CSV:\n{csv}");

    let nearby = db.products_near_user(1, 2_000.0)?;
    println!("{} products within 2 km of Alice", nearby.len());

    if let Some(metres) = db.average_buyer_seller_distance()? {
        println!("Average buyer-seller distance: {:.0} m", metres);
    }

    // 5. Workflows
    println!("\n=== 5. Workflows ===");
    let start = Utc.with_ymd_and_hms(2024, 11, 5, 0, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2024, 11, 12, 0, 0, 0).unwrap();
    let discounted = db.set_discount(1, 10.0, start, end)?;
    println!(
        "Headphones now {} (was {})",
        discounted.discount.discounted_price.unwrap(),
        discounted.price
    );
    db.clear_discount(1)?;
    println!("Discount cleared");

    let earned = db.earn_points(60.0, 1)?;
    println!("Alice earned {earned} loyalty points");
    match db.discount_from_points(10.0, 1)? {
        LoyaltyDiscount::Full => println!("Points fully cover a 10-unit purchase"),
        LoyaltyDiscount::Percent(p) => println!("Points cover {p:.1}% of a 10-unit purchase"),
    }

    // Cleanup
    println!("\nCleaning up store directory...");
    drop(db);
    std::fs::remove_dir_all(db_path)?;
    println!("Showcase finished successfully.");

    Ok(())
}
