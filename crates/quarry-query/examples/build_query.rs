//! Build a query with the fluent API and print its SQL, JSON form, and
//! fingerprint.
//!
//! Run with: cargo run --example build_query

use quarry_ir::{col, field, SelectItem};
use quarry_query::funcs::count;
use quarry_query::{QueryBuilder, QueryError};

fn main() -> Result<(), QueryError> {
    let recent = QueryBuilder::new()
        .from_table("[publicdata:samples.wikipedia]")?
        .select(vec![col("title").into(), col("wp_namespace").into()])?
        .limit(1000)?;

    let query = QueryBuilder::new()
        .from_table("[publicdata:samples.wikipedia]")?
        .join(&recent, "kp", "tp", field("tp", "title").eq(field("kp", "title")))?
        .filter(field("kp", "wp_namespace").eq(0))?
        .select(vec![
            field("kp", "title").into(),
            SelectItem::named("count", count(field("tp", "wp_namespace"))),
        ])?
        .group_by(vec![field("kp", "title")])?
        .order_by_desc(col("count"))?
        .limit(100)?;

    println!("=== SQL ===");
    println!("{}", query.to_sql()?);

    println!("\n=== Spec (JSON) ===");
    println!(
        "{}",
        serde_json::to_string_pretty(query.spec()).expect("spec serializes")
    );

    println!("\n=== Fingerprint ===");
    println!("{}", query.fingerprint());

    Ok(())
}
