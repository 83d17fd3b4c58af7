use std::fmt::Write;

use anyhow::Result;
use menu_engine::{
    analytics_objects::{AnalyticsReport, OrderAverages},
    db_types::{Order, Product},
};
use prettytable::{
    format::{LinePosition, LineSeparator, TableFormat},
    row,
    Table,
};

use crate::cart::Cart;

fn markdown_format() -> TableFormat {
    prettytable::format::FormatBuilder::new()
        .column_separator('|')
        .borders('|')
        .separator(LinePosition::Title, LineSeparator::new('-', '|', '|', '|'))
        .padding(1, 1)
        .build()
}

fn markdown_style(table: &mut Table) {
    table.set_format(markdown_format());
}

/// The menu, in the order the server sends it (by category, then name).
pub fn format_products(products: &[Product]) -> String {
    if products.is_empty() {
        return "The menu is empty".to_string();
    }
    let mut table = Table::new();
    table.set_titles(row!["ID", "Category", "Name", "Price", "Available", "Popular"]);
    products.iter().for_each(|p| {
        table.add_row(row![
            p.id,
            p.category,
            p.name,
            format!("{:>8}", p.price),
            if p.in_stock { "yes" } else { "sold out" },
            if p.popular { "★" } else { "" }
        ]);
    });
    markdown_style(&mut table);
    table.to_string()
}

pub fn format_orders(orders: &[Order]) -> String {
    if orders.is_empty() {
        return "No orders".to_string();
    }
    let mut table = Table::new();
    table.set_titles(row!["ID", "Table", "Status", "Items", "Total", "Payment", "Placed", "Notes"]);
    let mut notes = Vec::new();
    orders.iter().for_each(|order| {
        let note = match order.additional_info {
            Some(ref info) => {
                notes.push(info.clone());
                format!("{}^", notes.len())
            },
            None => String::default(),
        };
        let items =
            order.items.iter().map(|i| format!("{}x {}", i.quantity, i.product_name)).collect::<Vec<_>>().join(", ");
        table.add_row(row![
            order.id,
            order.table_number,
            order.status.to_string(),
            items,
            format!("{:>8}", order.total_amount),
            order.payment_method.to_string(),
            order.created_at.format("%Y-%m-%d %H:%M").to_string(),
            note
        ]);
    });
    markdown_style(&mut table);
    let notes = notes.iter().enumerate().map(|(i, n)| format!("^{}: {n}", i + 1)).collect::<Vec<String>>().join("\n");
    if notes.is_empty() {
        format!("{table}\n")
    } else {
        format!("{table}\n## Notes\n{notes}")
    }
}

pub fn format_order(order: &Order, f: &mut dyn Write) -> Result<()> {
    writeln!(f, "Order #{:<8} Table {:<4} Placed {}", order.id, order.table_number, order.created_at)?;
    match order.completed_at {
        Some(t) => writeln!(f, "[{:^15}]  Completed {t}", order.status.to_string())?,
        None => writeln!(f, "[{:^15}]", order.status.to_string())?,
    }
    writeln!(f, "-----------------------------------------------------------------------------")?;
    for item in &order.items {
        writeln!(f, "{:>3} x {:<40} {:>10}", item.quantity, item.product_name, item.line_total())?;
    }
    writeln!(f, "-----------------------------------------------------------------------------")?;
    writeln!(f, "Total: {} ({})", order.total_amount, order.payment_method)?;
    if let Some(info) = &order.additional_info {
        writeln!(f, "Notes: {info}")?;
    }
    Ok(())
}

pub fn format_cart(cart: &Cart) -> String {
    let mut table = Table::new();
    table.set_titles(row!["Qty", "Item", "Each", "Subtotal"]);
    cart.lines().iter().for_each(|l| {
        table.add_row(row![l.quantity, l.name, l.price.to_string(), l.line_total().to_string()]);
    });
    markdown_style(&mut table);
    format!("{table}\nTotal: {}\n", cart.total())
}

pub fn format_report(report: &AnalyticsReport) -> Result<String> {
    let mut f = String::new();
    let period = report.period.map(|p| p.to_string()).unwrap_or_else(|| "selected range".to_string());
    let s = &report.statistics;
    writeln!(f, "===============================================================================")?;
    writeln!(f, "Sales for {period}")?;
    writeln!(f, "===============================================================================")?;
    writeln!(f, "Orders:          {:>10}", s.total_orders)?;
    writeln!(f, "Revenue:         {:>10}", s.total_revenue)?;
    writeln!(f, "Average order:   {:>10}", s.avg_order_value)?;
    writeln!(f, "Cash / card:     {:>4} / {}", s.cash_orders, s.card_orders)?;
    if let Some(top) = &report.top_products {
        let mut table = Table::new();
        table.set_titles(row!["Product", "Sold", "Orders"]);
        top.iter().for_each(|p| {
            table.add_row(row![p.product_name, p.total_quantity, p.order_count]);
        });
        markdown_style(&mut table);
        writeln!(f, "\n## Best sellers\n{table}")?;
    }
    Ok(f)
}

pub fn format_averages(averages: &OrderAverages) -> String {
    format!(
        "Average order value\n  All time:     {:>10}\n  Last 7 days:  {:>10}\n  Last 30 days: {:>10}\n",
        averages.overall_avg, averages.weekly_avg, averages.monthly_avg
    )
}
