//! Personalized outreach letters for the premium-coverage segment.

use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::Connection;
use thiserror::Error;

use crate::db::DbError;
use crate::reports::{
    find_incomplete_coverage, find_most_recent_purchase, find_unpurchased_premium_products,
    MailingListEntry,
};

#[derive(Debug, Error)]
pub enum OutreachError {
    #[error(transparent)]
    Db(#[from] DbError),

    #[error("Failed to write letter {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Everything a letter needs.
#[derive(Debug, Clone, PartialEq)]
pub struct LetterContext {
    pub cust_id: i64,
    pub first: String,
    pub last: String,
    pub recent_product: String,
    pub unpurchased_product: String,
}

pub fn letter_file_name(cust_id: i64) -> String {
    format!("CustomerLetter_{}.txt", cust_id)
}

pub fn render_letter(ctx: &LetterContext) -> String {
    format!(
        "Dear {first} {last},\n\
         \n\
         Thank you for being a valued customer of the Hardware Store.\n\
         \n\
         We hope you are enjoying your recent purchase of {recent}.\n\
         \n\
         We see you haven't purchased any {unpurchased}, and we'd like to offer you a special deal! Please contact us for more info.\n\
         \n\
         Sincerely,\n\
         The Hardware Store\n",
        first = ctx.first,
        last = ctx.last,
        recent = ctx.recent_product,
        unpurchased = ctx.unpurchased_product,
    )
}

pub fn write_letter(out_dir: &Path, ctx: &LetterContext) -> Result<PathBuf, OutreachError> {
    let path = out_dir.join(letter_file_name(ctx.cust_id));
    fs::write(&path, render_letter(ctx)).map_err(|source| OutreachError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

/// Gather the two products a letter mentions. `None` when either is missing.
pub fn letter_context(
    conn: &Connection,
    entry: &MailingListEntry,
) -> Result<Option<LetterContext>, DbError> {
    let recent = find_most_recent_purchase(conn, entry.cust_id)?
        .into_iter()
        .next();
    let unpurchased = find_unpurchased_premium_products(conn, entry.cust_id)?
        .into_iter()
        .next();

    let (Some(recent), Some(unpurchased)) = (recent, unpurchased) else {
        return Ok(None);
    };

    Ok(Some(LetterContext {
        cust_id: entry.cust_id,
        first: entry.first.clone(),
        last: entry.last.clone(),
        recent_product: recent.product.prod_desc,
        unpurchased_product: unpurchased.prod_desc,
    }))
}

/// Write one letter per customer in the outreach segment into `out_dir`.
///
/// Returns the paths written, in customer-id order.
pub fn generate_outreach(conn: &Connection, out_dir: &Path) -> Result<Vec<PathBuf>, OutreachError> {
    fs::create_dir_all(out_dir).map_err(|source| OutreachError::Io {
        path: out_dir.to_path_buf(),
        source,
    })?;

    let mailing_list = find_incomplete_coverage(conn)?;
    let mut written = Vec::with_capacity(mailing_list.len());

    for entry in &mailing_list {
        let Some(ctx) = letter_context(conn, entry)? else {
            log::warn!(
                "Skipping letter for customer {}: no recent or unpurchased product",
                entry.cust_id
            );
            continue;
        };
        let path = write_letter(out_dir, &ctx)?;
        log::info!("{} successfully written.", path.display());
        written.push(path);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::StoreDb;
    use crate::schema::rebuild_schema;

    fn sample_ctx() -> LetterContext {
        LetterContext {
            cust_id: 7,
            first: "Ada".to_string(),
            last: "Lovelace".to_string(),
            recent_product: "Hammer".to_string(),
            unpurchased_product: "Cordless Drill".to_string(),
        }
    }

    #[test]
    fn test_render_letter_fills_template() {
        let letter = render_letter(&sample_ctx());
        assert!(letter.starts_with("Dear Ada Lovelace,\n"));
        assert!(letter.contains("recent purchase of Hammer."));
        assert!(letter.contains("haven't purchased any Cordless Drill,"));
        assert!(letter.ends_with("The Hardware Store\n"));
    }

    #[test]
    fn test_write_letter_uses_customer_id_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_letter(dir.path(), &sample_ctx()).unwrap();
        assert_eq!(path, dir.path().join("CustomerLetter_7.txt"));
        assert!(fs::read_to_string(&path).unwrap().contains("Ada Lovelace"));
    }

    #[test]
    fn test_generate_outreach_writes_flagged_customers_only() {
        let mut db = StoreDb::open_in_memory().unwrap();
        rebuild_schema(&mut db).unwrap();
        db.conn_ref()
            .execute_batch(
                "INSERT INTO states (st, state) VALUES ('MA', 'Massachusetts');
                 INSERT INTO zip_codes (zip, city, st) VALUES ('02134', 'Boston', 'MA');
                 INSERT INTO products (prod_id, prod_desc, unit_price) VALUES
                     (1, 'Hammer', 10.0), (2, 'Nails', 3.0), (3, 'Saw', 7.0);
                 INSERT INTO customers (first, last, addr, zip) VALUES
                     ('Ada', 'Lovelace', '1 Main St', '02134'),
                     ('Alan', 'Turing', '2 Main St', '02134');
                 INSERT INTO orders (cust_id, date) VALUES (1, '2024-01-01'), (2, '2024-01-01');
                 INSERT INTO order_lines (order_id, prod_id, qty) VALUES
                     (1, 1, 1), (1, 2, 2), (2, 1, 1), (2, 3, 1);",
            )
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("letters");
        let written = generate_outreach(db.conn_ref(), &out).unwrap();

        assert_eq!(written, vec![out.join("CustomerLetter_1.txt")]);
        let letter = fs::read_to_string(&written[0]).unwrap();
        assert!(letter.contains("recent purchase of Hammer."));
        assert!(letter.contains("haven't purchased any Saw,"));
    }
}
