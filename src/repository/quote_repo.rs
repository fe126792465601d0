// ==========================================
// 工程采购管理系统 - 报价单仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 提交顺序 (rowid) 即比价顺序
// ==========================================

use crate::domain::quote::{Quote, QuoteItem};
use crate::domain::types::QuoteStatus;
use crate::repository::codec::{from_json, parse_code, to_json};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

/// 报价单仓储
pub struct QuoteRepository {
    conn: Arc<Mutex<Connection>>,
}

struct QuoteRow {
    quote_id: String,
    inquiry_id: String,
    supplier_id: String,
    quoted_date: NaiveDateTime,
    payment_terms: String,
    validity_days: u32,
    total_amount: f64,
    status: String,
    items_json: String,
}

impl QuoteRow {
    fn from_row(row: &Row<'_>) -> SqliteResult<Self> {
        Ok(Self {
            quote_id: row.get(0)?,
            inquiry_id: row.get(1)?,
            supplier_id: row.get(2)?,
            quoted_date: row.get(3)?,
            payment_terms: row.get(4)?,
            validity_days: row.get(5)?,
            total_amount: row.get(6)?,
            status: row.get(7)?,
            items_json: row.get(8)?,
        })
    }

    fn into_quote(self) -> RepositoryResult<Quote> {
        let items: Vec<QuoteItem> = from_json("items_json", &self.items_json)?;
        Ok(Quote {
            quote_id: self.quote_id,
            inquiry_id: self.inquiry_id,
            supplier_id: self.supplier_id,
            quoted_date: self.quoted_date,
            items,
            payment_terms: self.payment_terms,
            validity_days: self.validity_days,
            total_amount: self.total_amount,
            status: parse_code("status", &self.status, QuoteStatus::from_db_str)?,
        })
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT quote_id, inquiry_id, supplier_id, quoted_date, payment_terms,
           validity_days, total_amount, status, items_json
    FROM quote
"#;

impl QuoteRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 新增报价单（编号重复视为唯一约束违反）
    pub fn insert(&self, quote: &Quote) -> RepositoryResult<()> {
        let items = to_json(&quote.items)?;
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO quote (
                quote_id, inquiry_id, supplier_id, quoted_date, payment_terms,
                validity_days, total_amount, status, items_json
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                quote.quote_id,
                quote.inquiry_id,
                quote.supplier_id,
                quote.quoted_date,
                quote.payment_terms,
                quote.validity_days,
                quote.total_amount,
                quote.status.to_string(),
                items,
            ],
        )?;
        Ok(())
    }

    pub fn find_by_id(&self, quote_id: &str) -> RepositoryResult<Option<Quote>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE quote_id = ?1", SELECT_COLUMNS);
        let result = conn.query_row(&sql, params![quote_id], QuoteRow::from_row);

        match result {
            Ok(row) => Ok(Some(row.into_quote()?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询询价单的全部报价（按提交顺序）
    pub fn list_by_inquiry(&self, inquiry_id: &str) -> RepositoryResult<Vec<Quote>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE inquiry_id = ?1 ORDER BY rowid", SELECT_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![inquiry_id], QuoteRow::from_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        rows.into_iter().map(QuoteRow::into_quote).collect()
    }

    /// 按编号列表查询（保持给定顺序; 不存在的编号跳过）
    pub fn find_by_ids(&self, quote_ids: &[String]) -> RepositoryResult<Vec<Quote>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE quote_id = ?1", SELECT_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let mut quotes = Vec::with_capacity(quote_ids.len());
        for id in quote_ids {
            match stmt.query_row(params![id], QuoteRow::from_row) {
                Ok(row) => quotes.push(row.into_quote()?),
                Err(rusqlite::Error::QueryReturnedNoRows) => {
                    tracing::warn!(quote_id = %id, "比价表引用的报价单不存在");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(quotes)
    }

    /// 更新报价单状态
    ///
    /// # 返回
    /// - Err(NotFound): 报价单不存在
    pub fn update_status(&self, quote_id: &str, status: QuoteStatus) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE quote SET status = ?1 WHERE quote_id = ?2",
            params![status.to_string(), quote_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::not_found("Quote", quote_id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn make_test_quote(id: &str, inquiry_id: &str, supplier_id: &str) -> Quote {
        let mut quote = Quote::new(
            id.to_string(),
            inquiry_id.to_string(),
            supplier_id.to_string(),
            "月結30天".to_string(),
            30,
            now(),
        );
        quote.add_quote_item(QuoteItem {
            item_id: "T001".to_string(),
            unit_price: 175.0,
            total_price: 87_500.0,
            delivery_days: 7,
            remarks: String::new(),
        });
        quote
    }

    #[test]
    fn test_list_by_inquiry_keeps_submission_order() {
        let repo = QuoteRepository::new(open_in_memory().unwrap());
        repo.insert(&make_test_quote("QUO000002", "INQ1", "SUP002")).unwrap();
        repo.insert(&make_test_quote("QUO000001", "INQ1", "SUP001")).unwrap();
        repo.insert(&make_test_quote("QUO000003", "INQ2", "SUP001")).unwrap();

        let quotes = repo.list_by_inquiry("INQ1").unwrap();
        let ids: Vec<_> = quotes.iter().map(|q| q.quote_id.as_str()).collect();
        assert_eq!(ids, vec!["QUO000002", "QUO000001"]);
        assert_eq!(quotes[0].total_amount, 87_500.0);
    }

    #[test]
    fn test_update_status() {
        let repo = QuoteRepository::new(open_in_memory().unwrap());
        repo.insert(&make_test_quote("QUO000001", "INQ1", "SUP001")).unwrap();
        repo.update_status("QUO000001", QuoteStatus::Accepted).unwrap();
        assert_eq!(
            repo.find_by_id("QUO000001").unwrap().unwrap().status,
            QuoteStatus::Accepted
        );

        let err = repo.update_status("QUO404", QuoteStatus::Rejected).unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }

    #[test]
    fn test_find_by_ids_skips_missing() {
        let repo = QuoteRepository::new(open_in_memory().unwrap());
        repo.insert(&make_test_quote("QUO000001", "INQ1", "SUP001")).unwrap();
        let quotes = repo
            .find_by_ids(&["QUO404".to_string(), "QUO000001".to_string()])
            .unwrap();
        assert_eq!(quotes.len(), 1);
    }
}
