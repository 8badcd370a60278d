//! # Derived Views
//!
//! Pure aggregations over cached collections for the Dashboard, Sales and
//! History screens. No mutation, no network, no clock reads: `today` is
//! always a parameter.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Dashboard                                                              │
//! │  ├── KPI cards: products, expiring soon, out of stock, users            │
//! │  ├── Pie chart: products per category (top slices first)                │
//! │  └── Bar chart: boxes sold per weekday                                  │
//! │                                                                         │
//! │  Sales screen                                                           │
//! │  ├── Sale form: only products with stock on the shelf                   │
//! │  └── Recent sales: latest 10 by business date                           │
//! │                                                                         │
//! │  History screen                                                         │
//! │  ├── Admin sees every sale, a seller only their own                     │
//! │  ├── Text search on product and seller names                            │
//! │  └── Totals: row count, boxes sold                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::expiry::bucket_products;
use crate::types::{Product, Sale, User};

// =============================================================================
// Dashboard Summary
// =============================================================================

/// The KPI card values on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    /// Catalog size.
    pub total_products: usize,
    /// Products expiring within 30 days (today included).
    pub expiring_soon: usize,
    /// Products already expired.
    pub expired: usize,
    /// Products with zero boxes on the shelf.
    pub out_of_stock: usize,
    /// Registered users.
    pub total_users: usize,
}

/// Computes the dashboard KPI cards.
pub fn dashboard_summary(products: &[Product], users: &[User], today: NaiveDate) -> DashboardSummary {
    let buckets = bucket_products(products, today);

    DashboardSummary {
        total_products: products.len(),
        expiring_soon: buckets.expiring_soon.len(),
        expired: buckets.expired.len(),
        out_of_stock: products.iter().filter(|p| p.is_out_of_stock()).count(),
        total_users: users.len(),
    }
}

// =============================================================================
// Category Distribution
// =============================================================================

/// One slice of the category pie chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CategorySlice {
    pub name: String,
    pub count: usize,
}

/// Counts products per category, biggest categories first.
///
/// Ties keep the order categories first appeared in the catalog, so the
/// chart is stable across refreshes.
pub fn products_by_category(products: &[Product]) -> Vec<CategorySlice> {
    let mut slices: Vec<CategorySlice> = Vec::new();

    for product in products {
        match slices.iter_mut().find(|s| s.name == product.categorie) {
            Some(slice) => slice.count += 1,
            None => slices.push(CategorySlice {
                name: product.categorie.clone(),
                count: 1,
            }),
        }
    }

    slices.sort_by(|a, b| b.count.cmp(&a.count));
    slices
}

// =============================================================================
// Sales Per Weekday
// =============================================================================

/// One bar of the weekly sales chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct WeekdaySales {
    /// French short weekday label ("lun.", "mar.", ...).
    pub name: String,
    /// Boxes sold on that weekday.
    pub ventes: i64,
}

/// French short weekday label, as `toLocaleDateString('fr-FR')` renders it.
fn weekday_label_fr(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "lun.",
        Weekday::Tue => "mar.",
        Weekday::Wed => "mer.",
        Weekday::Thu => "jeu.",
        Weekday::Fri => "ven.",
        Weekday::Sat => "sam.",
        Weekday::Sun => "dim.",
    }
}

/// Sums boxes sold per weekday, in the order weekdays first appear in the
/// sales list.
pub fn sales_by_weekday(sales: &[Sale]) -> Vec<WeekdaySales> {
    let mut bars: Vec<WeekdaySales> = Vec::new();

    for sale in sales {
        let label = weekday_label_fr(sale.date.weekday());
        match bars.iter_mut().find(|b| b.name == label) {
            Some(bar) => bar.ventes += sale.quantite_vendue,
            None => bars.push(WeekdaySales {
                name: label.to_string(),
                ventes: sale.quantite_vendue,
            }),
        }
    }

    bars
}

// =============================================================================
// Sales Screen Helpers
// =============================================================================

/// Products the sale form may offer: at least one box on the shelf.
pub fn available_products(products: &[Product]) -> Vec<Product> {
    products.iter().filter(|p| p.is_available()).cloned().collect()
}

/// The latest `limit` sales by business date, most recent first.
pub fn recent_sales(sales: &[Sale], limit: usize) -> Vec<Sale> {
    let mut sorted: Vec<Sale> = sales.to_vec();
    sorted.sort_by(|a, b| b.date.cmp(&a.date));
    sorted.truncate(limit);
    sorted
}

// =============================================================================
// Sales History View
// =============================================================================

/// The history screen's filtered sale list plus its summary totals.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SalesHistory {
    /// Matching sales, most recent business date first.
    pub sales: Vec<Sale>,
    /// Number of matching sales.
    pub total_count: usize,
    /// Boxes sold across matching sales.
    pub total_boxes: i64,
}

/// Filters the sales log for the history screen.
///
/// ## Scoping
/// Admins see every sale; a seller only the sales they recorded. The text
/// query matches the product or seller name, case-insensitively.
pub fn sales_history(sales: &[Sale], viewer: &User, query: &str) -> SalesHistory {
    let query = query.trim().to_lowercase();

    let mut matching: Vec<Sale> = sales
        .iter()
        .filter(|s| viewer.is_admin() || s.user_id == viewer.id)
        .filter(|s| {
            query.is_empty()
                || s.product_nom.to_lowercase().contains(&query)
                || s.user_name.to_lowercase().contains(&query)
        })
        .cloned()
        .collect();

    matching.sort_by(|a, b| b.date.cmp(&a.date));

    let total_boxes = matching.iter().map(|s| s.quantite_vendue).sum();

    SalesHistory {
        total_count: matching.len(),
        total_boxes,
        sales: matching,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UserRole;
    use chrono::{Duration, Utc};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn product(id: &str, categorie: &str, boites: i64, date_peremption: NaiveDate) -> Product {
        Product {
            id: id.to_string(),
            nom: format!("Produit {id}"),
            categorie: categorie.to_string(),
            numero_lot: "LOT-1".to_string(),
            date_peremption,
            quantite_boites: boites,
            quantite_unites: 0,
            prix_cents: 500,
            fournisseur: "Sanofi".to_string(),
            description: String::new(),
        }
    }

    fn sale(id: &str, user_id: &str, qty: i64, sale_date: NaiveDate) -> Sale {
        Sale {
            id: id.to_string(),
            product_id: "p1".to_string(),
            product_nom: "Doliprane 1000mg".to_string(),
            quantite_vendue: qty,
            date: sale_date,
            user_id: user_id.to_string(),
            user_name: format!("Vendeur {user_id}"),
            created_at: Utc::now(),
        }
    }

    fn user(id: &str, role: UserRole) -> User {
        User {
            id: id.to_string(),
            nom: "Diallo".to_string(),
            prenom: "Awa".to_string(),
            email: format!("{id}@officine.test"),
            role,
            badge_id: "B-1".to_string(),
        }
    }

    #[test]
    fn test_dashboard_summary() {
        let today = date(2026, 3, 1);
        let products = vec![
            product("a", "Antalgique", 0, today - Duration::days(2)),
            product("b", "Antalgique", 5, today + Duration::days(10)),
            product("c", "Vitamines", 2, today + Duration::days(120)),
        ];
        let users = vec![user("1", UserRole::Admin), user("2", UserRole::Vendeur)];

        let summary = dashboard_summary(&products, &users, today);
        assert_eq!(summary.total_products, 3);
        assert_eq!(summary.expired, 1);
        assert_eq!(summary.expiring_soon, 1);
        assert_eq!(summary.out_of_stock, 1);
        assert_eq!(summary.total_users, 2);
    }

    #[test]
    fn test_products_by_category_sorted_desc() {
        let today = date(2026, 3, 1);
        let exp = today + Duration::days(90);
        let products = vec![
            product("a", "Vitamines", 1, exp),
            product("b", "Antalgique", 1, exp),
            product("c", "Antalgique", 1, exp),
            product("d", "Antibiotique", 1, exp),
            product("e", "Antalgique", 1, exp),
        ];

        let slices = products_by_category(&products);
        assert_eq!(slices[0].name, "Antalgique");
        assert_eq!(slices[0].count, 3);
        assert_eq!(slices.len(), 3);
        // tie between Vitamines and Antibiotique keeps first-seen order
        assert_eq!(slices[1].name, "Vitamines");
        assert_eq!(slices[2].name, "Antibiotique");
    }

    #[test]
    fn test_sales_by_weekday_accumulates() {
        // 2026-03-02 is a Monday
        let monday = date(2026, 3, 2);
        let tuesday = date(2026, 3, 3);
        let next_monday = date(2026, 3, 9);

        let sales = vec![
            sale("1", "7", 2, monday),
            sale("2", "7", 1, tuesday),
            sale("3", "7", 4, next_monday),
        ];

        let bars = sales_by_weekday(&sales);
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].name, "lun.");
        assert_eq!(bars[0].ventes, 6);
        assert_eq!(bars[1].name, "mar.");
        assert_eq!(bars[1].ventes, 1);
    }

    #[test]
    fn test_available_products() {
        let today = date(2026, 3, 1);
        let exp = today + Duration::days(90);
        let products = vec![
            product("a", "Antalgique", 3, exp),
            product("b", "Antalgique", 0, exp),
        ];

        let available = available_products(&products);
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].id, "a");
    }

    #[test]
    fn test_recent_sales_limit_and_order() {
        let base = date(2026, 3, 1);
        let sales: Vec<Sale> = (0..15)
            .map(|i| sale(&i.to_string(), "7", 1, base + Duration::days(i)))
            .collect();

        let recent = recent_sales(&sales, 10);
        assert_eq!(recent.len(), 10);
        assert_eq!(recent[0].date, base + Duration::days(14));
        assert!(recent.windows(2).all(|w| w[0].date >= w[1].date));
    }

    #[test]
    fn test_sales_history_scoping() {
        let d = date(2026, 3, 1);
        let sales = vec![
            sale("1", "7", 2, d),
            sale("2", "8", 3, d + Duration::days(1)),
            sale("3", "7", 1, d + Duration::days(2)),
        ];

        let admin_view = sales_history(&sales, &user("1", UserRole::Admin), "");
        assert_eq!(admin_view.total_count, 3);
        assert_eq!(admin_view.total_boxes, 6);
        assert_eq!(admin_view.sales[0].id, "3");

        let seller_view = sales_history(&sales, &user("7", UserRole::Vendeur), "");
        assert_eq!(seller_view.total_count, 2);
        assert_eq!(seller_view.total_boxes, 3);
    }

    #[test]
    fn test_sales_history_query() {
        let d = date(2026, 3, 1);
        let mut autre = sale("2", "8", 3, d);
        autre.product_nom = "Smecta".to_string();

        let sales = vec![sale("1", "7", 2, d), autre];
        let admin = user("1", UserRole::Admin);

        let by_product = sales_history(&sales, &admin, "doliprane");
        assert_eq!(by_product.total_count, 1);
        assert_eq!(by_product.sales[0].id, "1");

        let by_seller = sales_history(&sales, &admin, "Vendeur 8");
        assert_eq!(by_seller.total_count, 1);
        assert_eq!(by_seller.sales[0].id, "2");

        let none = sales_history(&sales, &admin, "aspirine");
        assert_eq!(none.total_count, 0);
    }
}
