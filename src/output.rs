use std::io::Write;

use chrono::{DateTime, Utc};
use fundmatrix::chart::MIN_ZOOM_RANGE_MS;
use fundmatrix::columns::multi_quote_exchanges;
use fundmatrix::format::{format_apr, format_compact_usd, format_exchange, PLACEHOLDER};
use fundmatrix::{
    get_rate, ArbPair, ArbRow, ChartSeries, ExchangeColumn, FundingRow, ScreenedRow, TimeWindow,
    TokenRow,
};
use serde::Serialize;

use crate::error::ScreenerError;

const SCREEN_HEADER: &str = "token\tmax_spread\tlong\tlong_rate\tshort\tshort_rate\tbacktest_url\n";

/// One page of screener output.
#[derive(Debug, Serialize)]
pub struct ScreenPage<'a> {
    pub generated_at: Option<String>,
    pub window: TimeWindow,
    pub page: usize,
    pub pages: usize,
    pub total: usize,
    pub rows: &'a [ScreenedRow<'a>],
}

/// Write a screener page as TSV (with header) or as one JSON document.
pub fn write_screen<W: Write>(
    page: &ScreenPage<'_>,
    json_mode: bool,
    buf: &mut String,
    writer: &mut W,
) -> Result<(), ScreenerError> {
    buf.clear();

    if json_mode {
        serde_json::to_writer(&mut *writer, page)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        return Ok(());
    }

    buf.push_str(SCREEN_HEADER);
    for row in page.rows {
        buf.push_str(row.token);
        buf.push('\t');
        format_opt_f64(buf, row.max_spread);
        match &row.pair {
            Some(pair) => {
                buf.push('\t');
                buf.push_str(pair.long_key);
                buf.push('\t');
                format_f64(buf, pair.long_rate);
                buf.push('\t');
                buf.push_str(pair.short_key);
                buf.push('\t');
                format_f64(buf, pair.short_rate);
            }
            None => {
                for _ in 0..4 {
                    buf.push('\t');
                    buf.push_str(PLACEHOLDER);
                }
            }
        }
        buf.push('\t');
        buf.push_str(row.backtest_url.as_ref().map_or(PLACEHOLDER, |u| u.as_str()));
        buf.push('\n');
    }

    writer.write_all(buf.as_bytes())?;
    writer.flush()?;
    Ok(())
}

/// One market of a token as shown by `pair`.
#[derive(Debug, Serialize)]
struct MarketLine<'a> {
    key: &'a str,
    exchange: String,
    quote: Option<&'a str>,
    rate: Option<f64>,
    open_interest: Option<f64>,
    volume_24h: Option<f64>,
    ref_url: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct PairReport<'a> {
    token: &'a str,
    window: TimeWindow,
    markets: Vec<MarketLine<'a>>,
    pair: Option<&'a ArbPair<'a>>,
    backtest_url: Option<&'a str>,
}

/// Write every market of `row` and the chosen pair.
///
/// The quote asset is appended to the exchange label only for exchanges that
/// list more than one quote.
#[allow(clippy::too_many_arguments)]
pub fn write_pair<W: Write>(
    row: &TokenRow,
    columns: &[ExchangeColumn],
    window: TimeWindow,
    pair: Option<&ArbPair<'_>>,
    backtest_url: Option<&str>,
    json_mode: bool,
    buf: &mut String,
    writer: &mut W,
) -> Result<(), ScreenerError> {
    let multi_quote = multi_quote_exchanges(columns);
    let markets: Vec<MarketLine<'_>> = row
        .markets
        .iter()
        .map(|(key, market)| {
            let mut exchange = format_exchange(&market.exchange).to_string();
            if let Some(quote) = market.quote.as_deref() {
                if multi_quote.contains(&market.exchange) {
                    exchange.push_str(" (");
                    exchange.push_str(quote);
                    exchange.push(')');
                }
            }
            MarketLine {
                key,
                exchange,
                quote: market.quote.as_deref(),
                rate: get_rate(Some(market), window),
                open_interest: market.open_interest,
                volume_24h: market.volume_24h,
                ref_url: market.ref_url.as_deref(),
            }
        })
        .collect();

    buf.clear();

    if json_mode {
        let report = PairReport {
            token: &row.token,
            window,
            markets,
            pair,
            backtest_url,
        };
        serde_json::to_writer(&mut *writer, &report)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        return Ok(());
    }

    buf.push_str("market\texchange\trate\topen_interest\tvolume_24h\tref_url\n");
    for m in &markets {
        buf.push_str(m.key);
        buf.push('\t');
        buf.push_str(&m.exchange);
        buf.push('\t');
        buf.push_str(&format_apr(m.rate));
        buf.push('\t');
        buf.push_str(&format_compact_usd(m.open_interest));
        buf.push('\t');
        buf.push_str(&format_compact_usd(m.volume_24h));
        buf.push('\t');
        buf.push_str(m.ref_url.unwrap_or(PLACEHOLDER));
        buf.push('\n');
    }

    buf.push('\n');
    match pair {
        Some(p) => {
            buf.push_str("long\t");
            buf.push_str(p.long_key);
            buf.push('\t');
            buf.push_str(&format_apr(Some(p.long_rate)));
            buf.push_str("\nshort\t");
            buf.push_str(p.short_key);
            buf.push('\t');
            buf.push_str(&format_apr(Some(p.short_rate)));
            buf.push_str("\nspread\t");
            buf.push_str(&format_apr(Some(p.spread)));
            buf.push('\n');
        }
        None => {
            buf.push_str("no arbitrage pair for ");
            buf.push_str(window.label());
            buf.push('\n');
        }
    }
    buf.push_str("backtest\t");
    buf.push_str(backtest_url.unwrap_or(PLACEHOLDER));
    buf.push('\n');

    writer.write_all(buf.as_bytes())?;
    writer.flush()?;
    Ok(())
}

const ARB_HEADER: &str =
    "window\ttoken\tapr\tlong\tlong_quote\tshort\tshort_quote\topen_interest\tvolume_24h\n";

/// One page of opportunities of one window.
#[derive(Debug, Serialize)]
pub struct ArbPage<'a> {
    pub window: TimeWindow,
    pub page: usize,
    pub pages: usize,
    pub total: usize,
    pub rows: &'a [&'a ArbRow],
}

#[derive(Serialize)]
struct ArbReport<'a> {
    windows: &'a [ArbPage<'a>],
}

/// Write opportunity pages as one TSV table (with header) or one JSON
/// document.
pub fn write_opportunities<W: Write>(
    pages: &[ArbPage<'_>],
    json_mode: bool,
    buf: &mut String,
    writer: &mut W,
) -> Result<(), ScreenerError> {
    buf.clear();

    if json_mode {
        serde_json::to_writer(&mut *writer, &ArbReport { windows: pages })?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        return Ok(());
    }

    buf.push_str(ARB_HEADER);
    for page in pages {
        for row in page.rows {
            buf.push_str(page.window.label());
            buf.push('\t');
            buf.push_str(&row.base_asset);
            buf.push('\t');
            format_opt_f64(buf, Some(row.opportunity_apr).filter(|apr| !apr.is_nan()));
            buf.push('\t');
            buf.push_str(&row.long.exchange);
            buf.push('\t');
            buf.push_str(row.long.quote.as_deref().unwrap_or(PLACEHOLDER));
            buf.push('\t');
            buf.push_str(&row.short.exchange);
            buf.push('\t');
            buf.push_str(row.short.quote.as_deref().unwrap_or(PLACEHOLDER));
            buf.push('\t');
            format_opt_f64(buf, row.open_interest);
            buf.push('\t');
            format_opt_f64(buf, row.volume_24h);
            buf.push('\n');
        }
    }

    writer.write_all(buf.as_bytes())?;
    writer.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct FundingReport<'a> {
    total: usize,
    shown: usize,
    rows: &'a [&'a FundingRow],
}

/// Write funding rows as TSV (one column per window) or JSON.
pub fn write_funding<W: Write>(
    rows: &[&FundingRow],
    total: usize,
    json_mode: bool,
    buf: &mut String,
    writer: &mut W,
) -> Result<(), ScreenerError> {
    buf.clear();

    if json_mode {
        let report = FundingReport {
            total,
            shown: rows.len(),
            rows,
        };
        serde_json::to_writer(&mut *writer, &report)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        return Ok(());
    }

    buf.push_str("exchange\tmarket\tmarket_id");
    for window in TimeWindow::ALL {
        buf.push('\t');
        buf.push_str(window.label());
    }
    buf.push_str("\topen_interest\tvolume_24h\n");

    for row in rows {
        buf.push_str(&row.exchange);
        buf.push('\t');
        buf.push_str(&row.market);
        buf.push('\t');
        match row.market_id {
            Some(id) => buf.push_str(&id.to_string()),
            None => buf.push_str(PLACEHOLDER),
        }
        for window in TimeWindow::ALL {
            buf.push('\t');
            format_opt_f64(buf, row.rate(window));
        }
        buf.push('\t');
        format_opt_f64(buf, row.open_interest);
        buf.push('\t');
        format_opt_f64(buf, row.volume_24h);
        buf.push('\n');
    }

    writer.write_all(buf.as_bytes())?;
    writer.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct ChartReport<'a> {
    #[serde(flatten)]
    series: &'a ChartSeries,
    max_range_ms: i64,
    min_range_ms: i64,
}

/// Write a chart series as `time<TAB>apr` lines or as JSON with its zoom
/// limits.
pub fn write_chart<W: Write>(
    series: &ChartSeries,
    json_mode: bool,
    buf: &mut String,
    writer: &mut W,
) -> Result<(), ScreenerError> {
    buf.clear();

    if json_mode {
        let report = ChartReport {
            series,
            max_range_ms: series.span_ms(),
            min_range_ms: MIN_ZOOM_RANGE_MS,
        };
        serde_json::to_writer(&mut *writer, &report)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        return Ok(());
    }

    buf.push_str("time\tapr\n");
    for point in &series.points {
        match DateTime::<Utc>::from_timestamp_millis(point.x) {
            Some(t) => buf.push_str(&t.to_rfc3339()),
            None => buf.push_str(&point.x.to_string()),
        }
        buf.push('\t');
        format_f64(buf, point.y);
        buf.push('\n');
    }

    writer.write_all(buf.as_bytes())?;
    writer.flush()?;
    Ok(())
}

/// Fast f64 formatting via `ryu`.
fn format_f64(buf: &mut String, val: f64) {
    let mut b = ryu::Buffer::new();
    buf.push_str(b.format(val));
}

fn format_opt_f64(buf: &mut String, val: Option<f64>) {
    match val {
        Some(v) => format_f64(buf, v),
        None => buf.push_str(PLACEHOLDER),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fundmatrix::{
        build_series, find_best_pair, screen, ArbLeg, BacktestLinkBuilder, ChartPoint, Market,
        ScreenerQuery, SymbolNormalizer,
    };

    fn eth() -> TokenRow {
        TokenRow::new("ETH")
            .with_market(
                "binance:USDT",
                Market::new("binance", Some("USDT"))
                    .with_rate(TimeWindow::Now, 10.5)
                    .with_ref_url("https://www.binance.com/en/futures/ETHUSDT"),
            )
            .with_market(
                "binance:USDC",
                Market::new("binance", Some("USDC")).with_rate(TimeWindow::Now, 9.0),
            )
            .with_market("bybit", Market::new("bybit", Some("USDT")).with_rate(TimeWindow::Now, 4.0))
            .with_market("okx", Market::new("okx", Some("USDT")))
    }

    fn columns() -> Vec<ExchangeColumn> {
        vec![
            ExchangeColumn::new("binance:USDC", "binance", Some("USDC")),
            ExchangeColumn::new("binance:USDT", "binance", Some("USDT")),
            ExchangeColumn::new("bybit", "bybit", Some("USDT")),
            ExchangeColumn::new("okx", "okx", Some("USDT")),
        ]
    }

    fn links() -> BacktestLinkBuilder {
        BacktestLinkBuilder::new("https://bendbasis.com/backtester").unwrap()
    }

    fn render_screen(rows: &[TokenRow], json: bool) -> String {
        let screened = screen(
            rows,
            &columns(),
            &ScreenerQuery::default(),
            &SymbolNormalizer::default(),
            &links(),
        );
        let page = ScreenPage {
            generated_at: None,
            window: TimeWindow::Now,
            page: 1,
            pages: 1,
            total: screened.len(),
            rows: &screened,
        };
        let mut buf = String::new();
        let mut out = Vec::new();
        write_screen(&page, json, &mut buf, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    // ---- screen TSV ----

    #[test]
    fn test_screen_tsv() {
        let out = render_screen(&[eth(), TokenRow::new("WIF")], false);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], SCREEN_HEADER.trim_end());
        assert_eq!(
            lines[1],
            "ETH\t6.5\tbybit\t4.0\tbinance:USDT\t10.5\t\
             https://bendbasis.com/backtester?token=ETH&exchange1=bybitusdt&exchange2=binanceusdt"
        );
        assert_eq!(lines[2], "WIF\t–\t–\t–\t–\t–\t–");
    }

    #[test]
    fn test_screen_json() {
        let out = render_screen(&[eth()], true);
        let v: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v["window"], "now");
        assert_eq!(v["total"], 1);
        assert_eq!(v["rows"][0]["token"], "ETH");
        assert_eq!(v["rows"][0]["max_spread"], 6.5);
        assert_eq!(v["rows"][0]["pair"]["short_key"], "binance:USDT");
        assert!(v["generated_at"].is_null());
    }

    // ---- pair ----

    #[test]
    fn test_pair_tsv_labels_multi_quote() {
        let row = eth();
        let pair = find_best_pair(&row.markets, TimeWindow::Now, None);
        let mut buf = String::new();
        let mut out = Vec::new();
        write_pair(&row, &columns(), TimeWindow::Now, pair.as_ref(), None, false, &mut buf, &mut out)
            .unwrap();
        let out = String::from_utf8(out).unwrap();

        assert!(out.contains("binance:USDC\tBinance (USDC)\t9.00%\t–\t–\t–\n"));
        assert!(out.contains(
            "binance:USDT\tBinance (USDT)\t10.50%\t–\t–\thttps://www.binance.com/en/futures/ETHUSDT\n"
        ));
        assert!(out.contains("bybit\tBybit\t4.00%"));
        assert!(out.contains("okx\tOKX\t–\t"));
        assert!(out.contains("long\tbybit\t4.00%\nshort\tbinance:USDT\t10.50%\nspread\t6.50%\n"));
        assert!(out.ends_with("backtest\t–\n"));
    }

    #[test]
    fn test_pair_tsv_without_pair() {
        let row = TokenRow::new("WIF");
        let mut buf = String::new();
        let mut out = Vec::new();
        write_pair(&row, &[], TimeWindow::Day7, None, None, false, &mut buf, &mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("no arbitrage pair for 7d\n"));
    }

    #[test]
    fn test_pair_json() {
        let row = eth();
        let pair = find_best_pair(&row.markets, TimeWindow::Now, None);
        let url = "https://bendbasis.com/backtester?token=ETH";
        let mut buf = String::new();
        let mut out = Vec::new();
        write_pair(&row, &columns(), TimeWindow::Now, pair.as_ref(), Some(url), true, &mut buf, &mut out)
            .unwrap();
        let v: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(v["token"], "ETH");
        assert_eq!(v["markets"].as_array().unwrap().len(), 4);
        assert_eq!(v["markets"][1]["ref_url"], "https://www.binance.com/en/futures/ETHUSDT");
        assert_eq!(v["markets"][3]["key"], "okx");
        assert!(v["markets"][3]["rate"].is_null());
        assert_eq!(v["pair"]["spread"], 6.5);
        assert_eq!(v["backtest_url"], url);
    }

    // ---- opportunities ----

    fn opportunity(token: &str, window_days: u32, apr: f64) -> ArbRow {
        let mut row = ArbRow::new(token, window_days, apr).with_legs(
            ArbLeg::new("bybit", Some("USDT")),
            ArbLeg::new("hyperliquid", None),
        );
        row.volume_24h = Some(1.5e9);
        row
    }

    #[test]
    fn test_opportunities_tsv_one_header() {
        let now = [opportunity("ETH", 0, 12.25), opportunity("WIF", 0, f64::NAN)];
        let week = [opportunity("BTC", 7, 3.0)];
        let now_rows: Vec<&ArbRow> = now.iter().collect();
        let week_rows: Vec<&ArbRow> = week.iter().collect();
        let pages = [
            ArbPage {
                window: TimeWindow::Now,
                page: 1,
                pages: 1,
                total: 2,
                rows: &now_rows,
            },
            ArbPage {
                window: TimeWindow::Day7,
                page: 1,
                pages: 1,
                total: 1,
                rows: &week_rows,
            },
        ];
        let mut buf = String::new();
        let mut out = Vec::new();
        write_opportunities(&pages, false, &mut buf, &mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], ARB_HEADER.trim_end());
        assert_eq!(lines[1], "now\tETH\t12.25\tbybit\tUSDT\thyperliquid\t–\t–\t1500000000.0");
        assert_eq!(lines[2], "now\tWIF\t–\tbybit\tUSDT\thyperliquid\t–\t–\t1500000000.0");
        assert!(lines[3].starts_with("7d\tBTC\t3.0\t"));
    }

    #[test]
    fn test_opportunities_json() {
        let rows = [opportunity("ETH", 1, 5.5)];
        let refs: Vec<&ArbRow> = rows.iter().collect();
        let pages = [ArbPage {
            window: TimeWindow::Day1,
            page: 1,
            pages: 1,
            total: 1,
            rows: &refs,
        }];
        let mut buf = String::new();
        let mut out = Vec::new();
        write_opportunities(&pages, true, &mut buf, &mut out).unwrap();
        let v: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(v["windows"][0]["window"], "1d");
        assert_eq!(v["windows"][0]["rows"][0]["long_exchange"], "bybit");
        assert_eq!(v["windows"][0]["rows"][0]["opportunity_apr"], 5.5);
    }

    // ---- funding ----

    #[test]
    fn test_funding_tsv() {
        let mut row = FundingRow::new("bybit", "BTCUSDT")
            .with_rate(TimeWindow::Now, 10.5)
            .with_rate(TimeWindow::Day7, -2.0)
            .with_volume(2.0e9);
        row.market_id = Some(42);
        let rows = vec![&row];
        let mut buf = String::new();
        let mut out = Vec::new();
        write_funding(&rows, 3, false, &mut buf, &mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert_eq!(
            out,
            "exchange\tmarket\tmarket_id\tnow\t1d\t3d\t7d\t15d\t30d\topen_interest\tvolume_24h\n\
             bybit\tBTCUSDT\t42\t10.5\t–\t–\t-2.0\t–\t–\t–\t2000000000.0\n"
        );
    }

    #[test]
    fn test_funding_json_counts() {
        let row = FundingRow::new("okx", "ETH-USDT-SWAP");
        let rows = vec![&row];
        let mut buf = String::new();
        let mut out = Vec::new();
        write_funding(&rows, 9, true, &mut buf, &mut out).unwrap();
        let v: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(v["total"], 9);
        assert_eq!(v["shown"], 1);
        assert_eq!(v["rows"][0]["market"], "ETH-USDT-SWAP");
    }

    // ---- chart ----

    fn series() -> ChartSeries {
        let points = [
            ChartPoint::new("2025-05-01T00:00:00Z", 4.5),
            ChartPoint::new("2025-05-01T08:00:00Z", f64::NAN),
            ChartPoint::new("2025-05-01T16:00:00Z", -1.0),
        ];
        build_series(&points, chrono::Utc::now())
    }

    #[test]
    fn test_chart_tsv() {
        let mut buf = String::new();
        let mut out = Vec::new();
        write_chart(&series(), false, &mut buf, &mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert_eq!(
            out,
            "time\tapr\n2025-05-01T00:00:00+00:00\t4.5\n2025-05-01T16:00:00+00:00\t-1.0\n"
        );
    }

    #[test]
    fn test_chart_json_has_bounds() {
        let mut buf = String::new();
        let mut out = Vec::new();
        write_chart(&series(), true, &mut buf, &mut out).unwrap();
        let v: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(v["points"].as_array().unwrap().len(), 2);
        assert_eq!(v["min_x"], 1_746_057_600_000i64);
        assert_eq!(v["max_range_ms"], 16 * 60 * 60 * 1000);
        assert_eq!(v["min_range_ms"], MIN_ZOOM_RANGE_MS);
    }

    // ---- format_f64 ----

    #[test]
    fn test_format_opt_f64() {
        let mut buf = String::new();
        format_opt_f64(&mut buf, Some(-2.5));
        buf.push(' ');
        format_opt_f64(&mut buf, None);
        assert_eq!(buf, "-2.5 –");
    }
}
