//! Report record persistence
//!
//! Reports are write-once: one structured record per upload request, never
//! recomputed in place after insert. Structured fields (KPIs, availability,
//! narrative, charts) are stored as JSON columns.

use rusqlite::params;
use tracing::debug;

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{NewReport, Report};

impl Database {
    /// Insert a report record, returning the stored row
    pub fn insert_report(&self, report: &NewReport) -> Result<Report> {
        let conn = self.conn()?;

        conn.execute(
            r#"
            INSERT INTO reports (
                restaurant_name, report_type, period_label, primary_file_key,
                kpis, availability, narrative, charts, owner_email
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                report.restaurant_name,
                report.report_type,
                report.period_label,
                report.primary_file_key,
                serde_json::to_string(&report.kpis)?,
                serde_json::to_string(&report.available)?,
                serde_json::to_string(&report.narrative)?,
                serde_json::to_string(&report.charts)?,
                report.owner_email,
            ],
        )?;

        let id = conn.last_insert_rowid();
        debug!("Inserted report {} for {}", id, report.restaurant_name);

        drop(conn);
        self.get_report(id)
    }

    /// Fetch one report by id
    pub fn get_report(&self, id: i64) -> Result<Report> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, restaurant_name, report_type, period_label, primary_file_key,
                   kpis, availability, narrative, charts, owner_email, created_at
            FROM reports WHERE id = ?1
            "#,
        )?;

        let mut rows = stmt.query_map(params![id], row_to_report)?;
        match rows.next() {
            Some(row) => Ok(row?),
            None => Err(Error::NotFound(format!("Report {} not found", id))),
        }
    }

    /// List reports, newest first
    pub fn list_reports(&self, owner_email: Option<&str>, limit: i64) -> Result<Vec<Report>> {
        let conn = self.conn()?;

        let (sql, params_vec): (&str, Vec<Box<dyn rusqlite::ToSql>>) = match owner_email {
            Some(owner) => (
                r#"
                SELECT id, restaurant_name, report_type, period_label, primary_file_key,
                       kpis, availability, narrative, charts, owner_email, created_at
                FROM reports WHERE owner_email = ?1
                ORDER BY created_at DESC, id DESC LIMIT ?2
                "#,
                vec![Box::new(owner.to_string()), Box::new(limit)],
            ),
            None => (
                r#"
                SELECT id, restaurant_name, report_type, period_label, primary_file_key,
                       kpis, availability, narrative, charts, owner_email, created_at
                FROM reports
                ORDER BY created_at DESC, id DESC LIMIT ?1
                "#,
                vec![Box::new(limit)],
            ),
        };

        let param_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(param_refs.as_slice(), row_to_report)?;

        let mut reports = Vec::new();
        for row in rows {
            reports.push(row?);
        }
        Ok(reports)
    }
}

/// Map a database row onto a Report, parsing the JSON columns
fn row_to_report(row: &rusqlite::Row<'_>) -> rusqlite::Result<Report> {
    let kpis_json: String = row.get(5)?;
    let availability_json: String = row.get(6)?;
    let narrative_json: String = row.get(7)?;
    let charts_json: String = row.get(8)?;
    let created_at: String = row.get(10)?;

    Ok(Report {
        id: row.get(0)?,
        restaurant_name: row.get(1)?,
        report_type: row.get(2)?,
        period_label: row.get(3)?,
        primary_file_key: row.get(4)?,
        kpis: serde_json::from_str(&kpis_json).unwrap_or_default(),
        available: serde_json::from_str(&availability_json).unwrap_or_default(),
        narrative: serde_json::from_str(&narrative_json)
            .unwrap_or_else(|_| crate::models::NarrativeResult::unavailable()),
        charts: serde_json::from_str(&charts_json).unwrap_or_default(),
        owner_email: row.get(9)?,
        created_at: parse_datetime(&created_at),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChartBundle, KpiAvailability, KpiSet, NarrativeResult};

    fn sample_report(name: &str) -> NewReport {
        NewReport {
            restaurant_name: name.to_string(),
            report_type: "category_rollup".to_string(),
            period_label: Some("November".to_string()),
            primary_file_key: Some("abc123.csv".to_string()),
            kpis: KpiSet {
                net_sales: Some(800.0),
                guests: Some(35),
                ppa: Some(22.86),
                tip_percent: None,
                labor_percent: None,
            },
            available: KpiAvailability {
                net_sales: true,
                guests: true,
                ppa: true,
                tip_percent: false,
                labor_percent: false,
            },
            narrative: NarrativeResult::unavailable(),
            charts: ChartBundle::default(),
            owner_email: "owner@example.com".to_string(),
        }
    }

    #[test]
    fn test_insert_and_get_report() {
        let db = Database::in_memory().unwrap();

        let stored = db.insert_report(&sample_report("Joe's Diner")).unwrap();

        assert!(stored.id > 0);
        assert_eq!(stored.restaurant_name, "Joe's Diner");
        assert_eq!(stored.kpis.net_sales, Some(800.0));
        assert_eq!(stored.kpis.tip_percent, None);
        assert!(stored.available.ppa);
        assert!(!stored.available.tip_percent);
        assert!(!stored.narrative.available);

        let fetched = db.get_report(stored.id).unwrap();
        assert_eq!(fetched.kpis, stored.kpis);
        assert_eq!(fetched.period_label.as_deref(), Some("November"));
    }

    #[test]
    fn test_get_missing_report() {
        let db = Database::in_memory().unwrap();
        assert!(matches!(db.get_report(999), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_list_reports_filters_by_owner() {
        let db = Database::in_memory().unwrap();

        db.insert_report(&sample_report("A")).unwrap();
        let mut other = sample_report("B");
        other.owner_email = "other@example.com".to_string();
        db.insert_report(&other).unwrap();

        let all = db.list_reports(None, 10).unwrap();
        assert_eq!(all.len(), 2);

        let mine = db.list_reports(Some("owner@example.com"), 10).unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].restaurant_name, "A");
    }

    #[test]
    fn test_list_reports_newest_first() {
        let db = Database::in_memory().unwrap();
        db.insert_report(&sample_report("first")).unwrap();
        db.insert_report(&sample_report("second")).unwrap();

        let reports = db.list_reports(None, 10).unwrap();
        assert_eq!(reports[0].restaurant_name, "second");
        assert_eq!(reports[1].restaurant_name, "first");
    }
}
