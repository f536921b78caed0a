//! Premium-coverage reporting.
//!
//! A product is premium when its unit price is at or above
//! [`PREMIUM_PRICE_THRESHOLD`]. The outreach segment is every customer who has
//! bought some, but not all, of the premium products.

use rusqlite::{params, Connection};

use crate::db::DbError;

pub const PREMIUM_PRICE_THRESHOLD: f64 = 5.00;

/// A customer in the outreach segment.
#[derive(Debug, Clone, PartialEq)]
pub struct MailingListEntry {
    pub cust_id: i64,
    pub first: String,
    pub last: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductRow {
    pub prod_id: i64,
    pub prod_desc: String,
    pub unit_price: f64,
}

/// A line item from a customer's most recent order.
#[derive(Debug, Clone, PartialEq)]
pub struct RecentPurchase {
    pub order_id: i64,
    pub date: String,
    pub qty: i64,
    pub product: ProductRow,
}

/// Customers who bought at least one premium product but not every one.
pub fn find_incomplete_coverage(conn: &Connection) -> Result<Vec<MailingListEntry>, DbError> {
    let mut stmt = conn.prepare(
        "WITH premium AS (
             SELECT prod_id FROM products WHERE unit_price >= ?1
         ),
         bought AS (
             SELECT DISTINCT o.cust_id, ol.prod_id
             FROM orders o
             JOIN order_lines ol ON ol.order_id = o.order_id
             JOIN premium p ON p.prod_id = ol.prod_id
         )
         SELECT c.cust_id, c.first, c.last
         FROM customers c
         JOIN bought b ON b.cust_id = c.cust_id
         GROUP BY c.cust_id, c.first, c.last
         HAVING COUNT(*) < (SELECT COUNT(*) FROM premium)
         ORDER BY c.cust_id",
    )?;

    let rows = stmt.query_map(params![PREMIUM_PRICE_THRESHOLD], |row| {
        Ok(MailingListEntry {
            cust_id: row.get(0)?,
            first: row.get(1)?,
            last: row.get(2)?,
        })
    })?;

    let mut entries = Vec::new();
    for row in rows {
        entries.push(row?);
    }
    Ok(entries)
}

/// Premium products the customer has never ordered, most expensive first.
pub fn find_unpurchased_premium_products(
    conn: &Connection,
    cust_id: i64,
) -> Result<Vec<ProductRow>, DbError> {
    let mut stmt = conn.prepare(
        "SELECT p.prod_id, p.prod_desc, p.unit_price
         FROM products p
         WHERE p.unit_price >= ?2
           AND p.prod_id NOT IN (
               SELECT ol.prod_id
               FROM order_lines ol
               JOIN orders o ON o.order_id = ol.order_id
               WHERE o.cust_id = ?1
           )
         ORDER BY p.unit_price DESC, p.prod_id",
    )?;

    let rows = stmt.query_map(params![cust_id, PREMIUM_PRICE_THRESHOLD], |row| {
        Ok(ProductRow {
            prod_id: row.get(0)?,
            prod_desc: row.get(1)?,
            unit_price: row.get(2)?,
        })
    })?;

    let mut products = Vec::new();
    for row in rows {
        products.push(row?);
    }
    Ok(products)
}

/// The priciest line item(s) of the customer's latest order.
///
/// "Latest" is the order with the highest `order_id`; ids are assigned in load
/// order, not by `date`. Ties on price come back ordered by `prod_id`.
pub fn find_most_recent_purchase(
    conn: &Connection,
    cust_id: i64,
) -> Result<Vec<RecentPurchase>, DbError> {
    let mut stmt = conn.prepare(
        "WITH latest_lines AS (
             SELECT o.order_id, o.date, ol.qty, p.prod_id, p.prod_desc, p.unit_price
             FROM orders o
             JOIN order_lines ol ON ol.order_id = o.order_id
             JOIN products p ON p.prod_id = ol.prod_id
             WHERE o.order_id = (SELECT MAX(order_id) FROM orders WHERE cust_id = ?1)
         )
         SELECT order_id, date, qty, prod_id, prod_desc, unit_price
         FROM latest_lines
         WHERE unit_price = (SELECT MAX(unit_price) FROM latest_lines)
         ORDER BY prod_id",
    )?;

    let rows = stmt.query_map(params![cust_id], |row| {
        Ok(RecentPurchase {
            order_id: row.get(0)?,
            date: row.get(1)?,
            qty: row.get(2)?,
            product: ProductRow {
                prod_id: row.get(3)?,
                prod_desc: row.get(4)?,
                unit_price: row.get(5)?,
            },
        })
    })?;

    let mut purchases = Vec::new();
    for row in rows {
        purchases.push(row?);
    }
    Ok(purchases)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::StoreDb;
    use crate::schema::rebuild_schema;

    /// Products A ($10), B ($3), C ($7), D ($5, on the threshold).
    fn seeded_db() -> StoreDb {
        let mut db = StoreDb::open_in_memory().unwrap();
        rebuild_schema(&mut db).unwrap();
        db.conn_ref()
            .execute_batch(
                "INSERT INTO states (st, state) VALUES ('MA', 'Massachusetts');
                 INSERT INTO zip_codes (zip, city, st) VALUES ('02134', 'Boston', 'MA');
                 INSERT INTO products (prod_id, prod_desc, unit_price) VALUES
                     (1, 'A', 10.0), (2, 'B', 3.0), (3, 'C', 7.0), (4, 'D', 5.0);
                 INSERT INTO customers (first, last, addr, zip) VALUES
                     ('Ada', 'Lovelace', '1 Main St', '02134'),
                     ('Alan', 'Turing', '2 Main St', '02134'),
                     ('Grace', 'Hopper', '3 Main St', '02134'),
                     ('Edsger', 'Dijkstra', '4 Main St', '02134');",
            )
            .unwrap();
        db
    }

    fn order(db: &StoreDb, cust_id: i64, date: &str, lines: &[(i64, i64)]) -> i64 {
        let conn = db.conn_ref();
        let order_id: i64 = conn
            .query_row(
                "INSERT INTO orders (cust_id, date) VALUES (?1, ?2) RETURNING order_id",
                params![cust_id, date],
                |row| row.get(0),
            )
            .unwrap();
        for (prod_id, qty) in lines {
            conn.execute(
                "INSERT INTO order_lines (order_id, prod_id, qty) VALUES (?1, ?2, ?3)",
                params![order_id, prod_id, qty],
            )
            .unwrap();
        }
        order_id
    }

    #[test]
    fn test_partial_premium_buyer_is_flagged() {
        let db = seeded_db();
        // Ada: A only. Alan: every premium product. Grace: only B (not premium).
        order(&db, 1, "2024-01-01", &[(1, 1), (2, 3)]);
        order(&db, 2, "2024-01-01", &[(1, 1), (3, 1), (4, 1)]);
        order(&db, 3, "2024-01-01", &[(2, 5)]);

        let flagged = find_incomplete_coverage(db.conn_ref()).unwrap();
        assert_eq!(
            flagged,
            vec![MailingListEntry {
                cust_id: 1,
                first: "Ada".to_string(),
                last: "Lovelace".to_string(),
            }]
        );
    }

    #[test]
    fn test_repeat_purchases_count_once() {
        let db = seeded_db();
        // Alan buys A in two orders and never buys D
        order(&db, 2, "2024-01-01", &[(1, 1), (3, 1)]);
        order(&db, 2, "2024-01-02", &[(1, 2)]);

        let flagged = find_incomplete_coverage(db.conn_ref()).unwrap();
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].cust_id, 2);
    }

    #[test]
    fn test_unpurchased_ordered_by_price() {
        let db = seeded_db();
        order(&db, 1, "2024-01-01", &[(1, 1)]);

        let products = find_unpurchased_premium_products(db.conn_ref(), 1).unwrap();
        let ids: Vec<i64> = products.iter().map(|p| p.prod_id).collect();
        // C ($7) before D ($5); B is not premium; A already bought
        assert_eq!(ids, vec![3, 4]);
        assert_eq!(products[0].prod_desc, "C");
    }

    #[test]
    fn test_most_recent_uses_highest_order_id() {
        let db = seeded_db();
        order(&db, 1, "2024-03-01", &[(3, 1), (2, 1)]);
        // Later id but earlier date: still the "recent" one
        let latest = order(&db, 1, "2024-01-01", &[(2, 4)]);

        let recent = find_most_recent_purchase(db.conn_ref(), 1).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].order_id, latest);
        assert_eq!(recent[0].product.prod_desc, "B");
        assert_eq!(recent[0].qty, 4);
    }

    #[test]
    fn test_most_recent_picks_priciest_line() {
        let db = seeded_db();
        order(&db, 1, "2024-01-01", &[(2, 1), (1, 1), (3, 1)]);

        let recent = find_most_recent_purchase(db.conn_ref(), 1).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].product.prod_id, 1);
    }

    #[test]
    fn test_most_recent_returns_every_tied_line() {
        let db = seeded_db();
        db.conn_ref()
            .execute(
                "INSERT INTO products (prod_id, prod_desc, unit_price) VALUES (5, 'E', 7.0)",
                [],
            )
            .unwrap();
        order(&db, 1, "2024-01-01", &[(1, 1)]);
        let latest = order(&db, 1, "2024-01-02", &[(5, 1), (2, 3), (3, 2)]);

        let recent = find_most_recent_purchase(db.conn_ref(), 1).unwrap();
        let ids: Vec<i64> = recent.iter().map(|r| r.product.prod_id).collect();
        // C and E share the top price; ties come back by prod_id
        assert_eq!(ids, vec![3, 5]);
        assert!(recent.iter().all(|r| r.order_id == latest));
        assert_eq!(recent[0].qty, 2);
    }

    #[test]
    fn test_most_recent_empty_without_orders() {
        let db = seeded_db();
        assert!(find_most_recent_purchase(db.conn_ref(), 4).unwrap().is_empty());
    }

    #[test]
    fn test_no_premium_products_flags_nobody() {
        let db = seeded_db();
        db.conn_ref()
            .execute("UPDATE products SET unit_price = 1.0", [])
            .unwrap();
        order(&db, 1, "2024-01-01", &[(1, 1)]);
        assert!(find_incomplete_coverage(db.conn_ref()).unwrap().is_empty());
    }
}
