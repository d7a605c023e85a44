//! Ordered catalog of named benchmark queries.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

/// A labelled SQL statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedQuery {
    pub label: String,
    pub sql: String,
}

impl NamedQuery {
    pub fn new(label: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            sql: sql.into(),
        }
    }
}

/// Validated, insertion-ordered set of queries with unique labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Catalog {
    queries: Vec<NamedQuery>,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    queries: Vec<NamedQuery>,
}

impl Catalog {
    /// Validate and normalize a list of queries, preserving order.
    pub fn new(queries: Vec<NamedQuery>) -> Result<Self, CatalogError> {
        if queries.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut seen = HashSet::with_capacity(queries.len());
        let mut normalized = Vec::with_capacity(queries.len());
        for (index, query) in queries.into_iter().enumerate() {
            // Labels are compared trimmed but kept verbatim for display.
            let label = query.label.trim();
            if label.is_empty() {
                return Err(CatalogError::BlankLabel { index });
            }
            if !seen.insert(label.to_string()) {
                return Err(CatalogError::DuplicateLabel {
                    label: label.to_string(),
                });
            }

            let sql = normalize_sql(&query.sql);
            if sql.is_empty() {
                return Err(CatalogError::BlankStatement {
                    label: label.to_string(),
                });
            }

            normalized.push(NamedQuery::new(query.label.as_str(), sql));
        }

        Ok(Self {
            queries: normalized,
        })
    }

    /// Parse `{"queries": [{"label": ..., "sql": ...}, ...]}`.
    pub fn from_json(text: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(text)?;
        Self::new(file.queries)
    }

    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let text = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// The five underwriting queries against `policies`, `customers` and `claims`.
    pub fn underwriting() -> Self {
        Self {
            queries: UNDERWRITING_QUERIES
                .iter()
                .map(|(label, sql)| NamedQuery::new(*label, normalize_sql(sql)))
                .collect(),
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NamedQuery> {
        self.queries.iter()
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.queries.iter().map(|query| query.label.as_str())
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a NamedQuery;
    type IntoIter = std::slice::Iter<'a, NamedQuery>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Trim surrounding whitespace and trailing statement terminators.
fn normalize_sql(sql: &str) -> String {
    sql.trim().trim_end_matches(';').trim().to_string()
}

const UNDERWRITING_QUERIES: [(&str, &str); 5] = [
    (
        "Count policies by type and status",
        r"
        SELECT policy_type, policy_status, COUNT(*) as policy_count
        FROM policies
        GROUP BY 1, 2
        ORDER BY 1, 2
        ",
    ),
    (
        "Avg premium by policy type (last year)",
        r"
        SELECT policy_type, AVG(premium_amount) as avg_premium
        FROM policies
        WHERE effective_date >= DATEADD(year, -1, CURRENT_DATE())
        GROUP BY 1
        ORDER BY 2 DESC
        ",
    ),
    (
        "Identify high-risk policies",
        r"
        SELECT policy_number, policy_type, coverage_limit, premium_amount,
               coverage_limit / premium_amount as risk_ratio
        FROM policies
        WHERE policy_status = 'ACTIVE'
        AND coverage_limit / premium_amount > 1000
        ORDER BY risk_ratio DESC
        LIMIT 100
        ",
    ),
    (
        "Customer policy history",
        r"
        SELECT c.customer_id, c.last_name, c.first_name,
               p.policy_number, p.policy_type, p.effective_date, p.expiration_date,
               COUNT(cl.claim_id) as claim_count
        FROM customers c
        JOIN policies p ON c.customer_id = p.customer_id
        LEFT JOIN claims cl ON p.policy_number = cl.policy_number
        WHERE c.customer_id = '12345'
        GROUP BY 1, 2, 3, 4, 5, 6, 7
        ORDER BY p.effective_date DESC
        ",
    ),
    (
        "Policy renewal candidates",
        r"
        SELECT p.policy_number, p.policy_type, p.expiration_date,
               c.last_name, c.first_name, c.risk_score
        FROM policies p
        JOIN customers c ON p.customer_id = c.customer_id
        WHERE p.expiration_date BETWEEN CURRENT_DATE() AND DATEADD(month, 1, CURRENT_DATE())
        AND p.policy_status = 'ACTIVE'
        AND c.risk_score < 50
        ORDER BY p.expiration_date
        ",
    ),
];
