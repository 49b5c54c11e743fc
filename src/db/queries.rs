//! Fixed SQL text. MySQL dialect.

pub const SHOW_TABLES: &str = "SHOW TABLES";

/// Catalog statistics per table. `table_rows` is an engine estimate for InnoDB.
pub const TABLE_CATALOG: &str = r#"
SELECT
    CAST(table_name AS CHAR) AS name,
    CAST(table_rows AS UNSIGNED) AS records,
    CAST(data_length + index_length AS UNSIGNED) AS size,
    update_time AS last_updated
FROM information_schema.tables
WHERE table_schema = ?
"#;

pub const CHART_INVENTORY: &str = r#"
SELECT name AS label, stock AS value
FROM inventory
ORDER BY stock DESC
LIMIT 10
"#;

pub const CHART_ORDERS: &str = r#"
SELECT DATE_FORMAT(created_at, '%Y-%m-%d') AS label,
       COUNT(*) AS value
FROM orders
GROUP BY DATE_FORMAT(created_at, '%Y-%m-%d')
ORDER BY label DESC
LIMIT 10
"#;

pub const CHART_PAYMENTS: &str = r#"
SELECT status AS label,
       COUNT(*) AS value
FROM payments
GROUP BY status
"#;

pub const CHART_FINANCIAL: &str = r#"
SELECT 'Revenue' AS label, total_revenue AS value
FROM financial_summary
UNION
SELECT 'Expenses' AS label, total_expenses AS value
FROM financial_summary
UNION
SELECT 'Profit' AS label, net_profit AS value
FROM financial_summary
"#;
