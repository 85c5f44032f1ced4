use criterion::{Criterion, criterion_group, criterion_main};

use bazaar_db::Bazaar;
use bazaar_db::geo::GeoPoint;
use bazaar_db::model::{Category, Discount, Product, Review, Role, Subcategory, Transaction, User};

const CATEGORIES: u64 = 20;
const SUBCATEGORIES: u64 = 4;
const PRODUCTS: u64 = 10;
const TRANSACTIONS: u64 = 2_000;

fn seed(db: &Bazaar) {
    for id in 0..50u64 {
        db.insert_user(&User {
            id,
            name: format!("User {id}"),
            email: format!("user{id}@example.com"),
            address: "10 Market Lane".to_string(),
            password: "longenough".to_string(),
            location: GeoPoint::new(-46.0 - (id as f64) * 0.01, -23.0),
            role: if id % 5 == 0 { Role::Seller } else { Role::Buyer },
            loyalty_points: 0,
        })
        .unwrap();
    }

    let mut product_id = 0u64;
    for c in 0..CATEGORIES {
        let mut subcategories = Vec::new();
        for s in 0..SUBCATEGORIES {
            let mut products = Vec::new();
            for _ in 0..PRODUCTS {
                product_id += 1;
                products.push(Product {
                    id: product_id,
                    name: format!("Product {product_id}"),
                    description: "Benchmark fixture product record".to_string(),
                    price: 10.0 + (product_id % 90) as f64,
                    stock_quantity: u32::MAX,
                    location: Some(GeoPoint::new(
                        -46.0 - (product_id % 100) as f64 * 0.005,
                        -23.0,
                    )),
                    discount: Discount::default(),
                });
            }
            subcategories.push(Subcategory {
                name: format!("Subcategory {s}"),
                products,
            });
        }
        db.insert_category(&Category {
            name: format!("Category {c}"),
            subcategories,
        })
        .unwrap();
    }

    let total_products = CATEGORIES * SUBCATEGORIES * PRODUCTS;
    for id in 0..TRANSACTIONS {
        db.record_transaction(&Transaction {
            id,
            user_id: id % 50,
            product_id: 1 + id % total_products,
            seller_id: (id % 10) * 5,
        })
        .unwrap();
    }

    for id in 0..500u64 {
        db.insert_review(&Review {
            rating: (id % 6) as u8,
            comment: None,
            user_id: id % 50,
            product_id: 1 + id % total_products,
            seller_reply: None,
        })
        .unwrap();
    }
}

fn report_benchmarks(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let db = Bazaar::open(dir.path().join("bench.db")).unwrap();
    seed(&db);

    c.bench_function("sales_by_category", |b| {
        b.iter(|| db.sales_by_category().unwrap())
    });

    c.bench_function("average_rating_per_product", |b| {
        b.iter(|| db.average_rating_per_product().unwrap())
    });

    c.bench_function("spend_per_user", |b| {
        b.iter(|| db.spend_per_user().unwrap())
    });

    c.bench_function("products_near_user_5km", |b| {
        b.iter(|| db.products_near_user(0, 5_000.0).unwrap())
    });
}

criterion_group!(benches, report_benchmarks);
criterion_main!(benches);
