use std::time::Duration;

use anyhow::{Context, Result};

use scd_reconcile::{LossFilter, Page, ReconcileFilters, ReconcileReport, ZoneFilter};
use scd_runtime::{run_reconcile, settings_from_config, ReconcileQuery, Stores};
use scd_schemas::DateRange;

use super::{load_engine_config, money, text};

pub struct ReconcileArgs {
    pub config_paths: Vec<String>,
    pub start: String,
    pub end: String,
    pub zone: String,
    pub loss: String,
    pub search: String,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
    pub json: bool,
}

impl ReconcileArgs {
    fn query(&self) -> Result<ReconcileQuery> {
        let range = DateRange::parse_days(&self.start, &self.end)?;
        let page = match (self.page, self.page_size) {
            (Some(n), Some(size)) => Some(Page::new(n, size)),
            (None, Some(size)) => Some(Page::new(1, size)),
            _ => None,
        };
        Ok(ReconcileQuery {
            range,
            filters: ReconcileFilters {
                zone: ZoneFilter::parse(&self.zone),
                loss: LossFilter::parse(&self.loss),
                search: self.search.trim().to_string(),
                page,
            },
        })
    }
}

pub async fn run(args: ReconcileArgs) -> Result<()> {
    let query = args.query()?;
    let (loaded, cfg) = load_engine_config(&args.config_paths)?;
    let secrets = scd_config::resolve_store_secrets(&cfg)?;
    let stores = Stores::from_config(&cfg, &secrets)?;

    let report = run_reconcile(
        &stores,
        &query,
        &settings_from_config(&cfg),
        Duration::from_secs(cfg.store.timeout_secs),
    )
    .await
    .context("reconcile failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("config_hash={}", loaded.config_hash);
        print_report(&report, &cfg.reconcile.regional_bucket.label);
    }
    Ok(())
}

fn print_report(report: &ReconcileReport, bucket_label: &str) {
    let s = &report.stats;
    println!("total_orders={}", report.total_orders);
    if let Some(p) = report.page {
        println!("page={} page_size={}", p.number, p.size);
    }
    println!("total_loss={}", money(s.total_loss));
    println!("orders_with_loss={}", s.orders_with_loss);
    println!("average_loss={}", money(s.average_loss));
    println!("biggest_loss={}", money(s.biggest_loss));
    println!("regional_bucket={}", text(bucket_label));
    println!("regional_loss={}", money(s.toronto_gta_loss));
    println!("regional_orders={}", s.toronto_gta_orders);
    println!("total_discounts_given={}", money(s.total_discounts_given));
    println!("free_shipping_orders={}", s.free_shipping_orders);
    println!("avg_discount={}", money(s.avg_discount));

    for r in &report.orders {
        println!(
            "order id={} source={} number={} created_at={} zone={} charged={} actual={} difference={} carrier_cost={} free_shipping={} customer={}",
            text(&r.order.id),
            r.order.source.as_str(),
            text(&r.order.order_number),
            r.order.created_at.to_rfc3339(),
            text(&r.matched_zone_name),
            money(r.charged),
            money(r.actual_cost),
            money(r.difference),
            r.has_carrier_cost,
            r.was_free_shipping,
            text(&r.order.customer_email),
        );
    }
}
