//! HTML rendering for the upload, selection and report pages
//!
//! Every user-supplied string goes through [`escape_html`] before it lands in
//! markup, and JSON embedded in `<script>` goes through [`script_json`].

use std::fmt::Write as _;

use chrono::{DateTime, Datelike, Utc};
use funding_ledger_core::{FundingReport, MarketStatistics, RawRecord};
use serde::Serialize;

const CHART_JS_CDN: &str = "https://cdn.jsdelivr.net/npm/chart.js@4.4.0/dist/chart.umd.min.js";

const STYLE: &str = r#"
  body { font-family: system-ui, sans-serif; background: #0f172a; color: #e2e8f0; margin: 0; }
  .container { max-width: 1400px; margin: 0 auto; padding: 24px; }
  h1 { margin: 0 0 8px; } a { color: #10b981; }
  .card, .market-card, .table-container { background: #1e293b; border: 1px solid #334155; border-radius: 12px; padding: 20px; margin-bottom: 20px; }
  .markets-grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(420px, 1fr)); gap: 20px; }
  .market-header { display: flex; justify-content: space-between; align-items: center; }
  .market-name { font-size: 20px; font-weight: 700; }
  .stats-row { display: grid; grid-template-columns: repeat(3, 1fr); gap: 12px; margin: 16px 0; }
  .stat-label, .forecast-label { font-size: 12px; color: #94a3b8; text-transform: uppercase; }
  .stat-value { font-size: 18px; font-weight: 600; }
  .forecast-value { font-size: 24px; font-weight: 700; color: #10b981; }
  .chart-container { height: 220px; }
  .timeframe-btn.active, button.primary { background: #10b981; color: #0f172a; }
  button { background: #334155; color: #e2e8f0; border: 0; border-radius: 6px; padding: 6px 10px; cursor: pointer; }
  .market-list { display: grid; grid-template-columns: repeat(auto-fill, minmax(160px, 1fr)); gap: 8px; margin: 16px 0; }
  table { width: 100%; border-collapse: collapse; }
  th, td { padding: 8px; border-bottom: 1px solid #334155; text-align: left; }
  th.sortable { cursor: pointer; }
  th.sort-asc::after { content: " \25B2"; } th.sort-desc::after { content: " \25BC"; }
  .side-long { color: #10b981; } .side-short { color: #ef4444; }
  .warning { color: #f59e0b; font-size: 12px; }
"#;

/// Escapes the five HTML-significant characters
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Serializes `value` for inline `<script>` use; `<` becomes `\u003c`
pub fn script_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    Ok(serde_json::to_string(value)?.replace('<', "\\u003c"))
}

/// Fixed-point formatting with trailing zeros removed
pub fn trim_fixed(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, value);
    let trimmed = if formatted.contains('.') {
        formatted.trim_end_matches('0').trim_end_matches('.')
    } else {
        formatted.as_str()
    };
    match trimmed {
        "-0" => "0".to_string(),
        other => other.to_string(),
    }
}

fn page(title: &str, body: &str, scripts: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{title}</title>
  <style>{STYLE}</style>
</head>
<body>
  <div class="container">
{body}
  </div>
{scripts}
</body>
</html>"#,
        title = escape_html(title),
    )
}

/// Landing page with the CSV upload form
pub fn upload_page() -> String {
    let body = r#"    <h1>Funding Ledger</h1>
    <p>Upload a funding-payment CSV export (market, side, date, size, payment, rate).</p>
    <form class="card" action="/upload" method="post" enctype="multipart/form-data">
      <input type="file" name="csvFile" accept=".csv,text/csv" required>
      <button class="primary" type="submit">Analyse</button>
    </form>"#;
    page("Funding Ledger", body, "")
}

/// Market picker; the CSV rides along in a hidden field
pub fn selection_page(csv_text: &str, markets: &[String]) -> String {
    let mut options = String::new();
    for market in markets {
        let market = escape_html(market);
        let _ = writeln!(
            options,
            r#"        <label class="market-option" data-market="{market}"><input type="checkbox" name="markets" value="{market}" checked> {market}</label>"#
        );
    }

    let body = format!(
        r#"    <h1>Select markets</h1>
    <p>{count} markets found. <a href="/">Upload another file</a></p>
    <form class="card" action="/view" method="post">
      <input type="hidden" name="csvData" value="{csv}">
      <input type="text" id="marketSearch" placeholder="Filter markets..." onkeyup="filterMarkets()">
      <button type="button" onclick="setAll(true)">Select all</button>
      <button type="button" onclick="setAll(false)">Select none</button>
      <span><strong id="selectedCount">{count}</strong> selected</span>
      <div class="market-list">
{options}      </div>
      <button class="primary" type="submit">Show report</button>
    </form>"#,
        count = markets.len(),
        csv = escape_html(csv_text),
    );

    let scripts = r#"<script>
  function updateCount() {
    document.getElementById('selectedCount').textContent =
      document.querySelectorAll('input[name="markets"]:checked').length;
  }
  function setAll(checked) {
    document.querySelectorAll('.market-option').forEach(label => {
      if (label.style.display !== 'none') label.querySelector('input').checked = checked;
    });
    updateCount();
  }
  function filterMarkets() {
    const query = document.getElementById('marketSearch').value.toLowerCase();
    document.querySelectorAll('.market-option').forEach(label => {
      label.style.display = label.dataset.market.toLowerCase().includes(query) ? '' : 'none';
    });
  }
  document.querySelectorAll('input[name="markets"]').forEach(box => box.addEventListener('change', updateCount));
</script>"#;

    page("Select markets", &body, scripts)
}

fn market_card(
    index: usize,
    market: &str,
    stats: Option<&MarketStatistics>,
    now: DateTime<Utc>,
) -> String {
    let name = escape_html(market);
    let Some(stats) = stats else {
        return format!(
            r#"      <div class="market-card"><div class="market-name">{name}</div><p>No rows for this market.</p></div>
"#
        );
    };

    let quality = if stats.quality.is_clean() {
        String::new()
    } else {
        format!(
            r#"<div class="warning">{} payment, {} rate and {} date cells could not be read and were counted as zero or skipped.</div>"#,
            stats.quality.malformed_payments,
            stats.quality.malformed_rates,
            stats.quality.invalid_timestamps
        )
    };

    let projection = stats.projection(now);

    format!(
        r#"      <div class="market-card" data-index="{index}">
        <div class="market-header">
          <div class="market-name">{name}</div>
          <div class="timeframe-selector">
            <button class="timeframe-btn" data-timeframe="day" onclick="changeTimeframe({index}, 'day', this)">24H</button>
            <button class="timeframe-btn" data-timeframe="week" onclick="changeTimeframe({index}, 'week', this)">7D</button>
            <button class="timeframe-btn" data-timeframe="month" onclick="changeTimeframe({index}, 'month', this)">30D</button>
            <button class="timeframe-btn active" data-timeframe="all" onclick="changeTimeframe({index}, 'all', this)">ALL</button>
          </div>
        </div>
        <div class="stats-row">
          <div><div class="stat-label">Total Payment</div><div class="stat-value">${total}</div></div>
          <div><div class="stat-label">Avg Rate</div><div class="stat-value">{avg}%</div></div>
          <div><div class="stat-label">Rate Range</div><div class="stat-value">{min}% - {max}%</div></div>
        </div>
        <div class="chart-container"><canvas id="chart-{index}"></canvas></div>
        <div class="forecast-label">Forecast to {year}-12-31 ({count} payments)</div>
        <div class="forecast-value">${forecast}</div>
        <div class="stat-label">${per_day} per day over {span} days observed</div>
        {quality}
      </div>
"#,
        total = format!("{:.2}", stats.total_payment),
        avg = trim_fixed(stats.avg_rate, 6),
        min = trim_fixed(stats.min_rate, 10),
        max = trim_fixed(stats.max_rate, 10),
        forecast = format!("{:.2}", stats.year_end_forecast),
        count = stats.count,
        year = now.year(),
        per_day = format!("{:.2}", projection.avg_payment_per_day),
        span = trim_fixed(projection.days_since_start, 2),
    )
}

fn table_row(row: &RawRecord) -> String {
    let side = escape_html(&row.side().to_lowercase());
    format!(
        r#"          <tr><td>{market}</td><td class="side-{side}">{side_upper}</td><td>{date}</td><td>{size}</td><td>${payment}</td><td>{rate}%</td></tr>
"#,
        market = escape_html(row.market()),
        side_upper = escape_html(&row.side().to_uppercase()),
        date = escape_html(row.timestamp_raw()),
        size = format!("{:.2}", row.size().value),
        payment = format!("{:.6}", row.payment().value),
        rate = trim_fixed(row.scaled_rate().value, 10),
    )
}

/// Full analytics page: stat cards, charts and the transaction table
pub fn report_page(report: &FundingReport) -> Result<String, serde_json::Error> {
    let headers = &report.headers;

    let mut cards = String::new();
    for (index, market) in report.selected_markets.iter().enumerate() {
        cards.push_str(&market_card(
            index,
            market,
            report.stats.get(market),
            report.generated_at,
        ));
    }

    let mut market_options = String::new();
    for market in &report.selected_markets {
        let market = escape_html(market);
        let _ = write!(market_options, r#"<option value="{market}">{market}</option>"#);
    }

    let mut header_cells = String::new();
    for (column, kind) in ["string", "string", "date", "number", "number", "number"]
        .iter()
        .enumerate()
    {
        let label = if column == 0 {
            "Market".to_string()
        } else {
            escape_html(headers.field(column))
        };
        let _ = write!(
            header_cells,
            r#"<th class="sortable" onclick="sortTable({column}, '{kind}')">{label}</th>"#
        );
    }

    let mut rows = String::new();
    for row in &report.rows {
        rows.push_str(&table_row(row));
    }

    let body = format!(
        r#"    <h1>Funding Analytics</h1>
    <p>{row_count} transactions across {market_count} markets. Total payment ${total}, forecast ${forecast}. <a href="/">New analysis</a></p>
    <div class="markets-grid">
{cards}    </div>
    <div class="table-container">
      <input type="text" id="searchBox" placeholder="Search..." onkeyup="filterTable()">
      <select id="marketFilter" onchange="filterTable()"><option value="">All markets</option>{market_options}</select>
      <select id="sideFilter" onchange="filterTable()"><option value="">All sides</option><option value="long">Long</option><option value="short">Short</option></select>
      <span><strong id="visibleRows">{row_count}</strong> / {row_count}</span>
      <table>
        <thead><tr>{header_cells}</tr></thead>
        <tbody id="tableBody">
{rows}        </tbody>
      </table>
    </div>"#,
        row_count = report.row_count(),
        market_count = report.selected_markets.len(),
        total = format!("{:.2}", report.total_payment()),
        forecast = format!("{:.2}", report.total_forecast()),
    );

    let series: Vec<_> = report.charts.values().collect();
    let scripts = format!(
        r#"<script src="{CHART_JS_CDN}"></script>
<script>
  const chartData = {series};
  const generatedAt = new Date({generated_at});
  const windows = {{ day: 864e5, week: 6048e5, month: 2592e6 }};
  const charts = {{}};
  let currentSort = {{ column: -1, direction: 'asc' }};

  function initChart(index, timeframe) {{
    const canvas = document.getElementById('chart-' + index);
    if (!canvas || !window.Chart) return;
    const cutoff = timeframe === 'all' ? 0 : generatedAt - windows[timeframe];
    const points = chartData[index].filter(p => p.timestamp && new Date(p.timestamp) >= cutoff);
    if (charts[index]) charts[index].destroy();
    charts[index] = new Chart(canvas, {{
      type: 'line',
      data: {{
        labels: points.map(p => new Date(p.timestamp).toLocaleString()),
        datasets: [{{ label: 'Rate (%)', data: points.map(p => p.rate), borderColor: '#10b981', pointRadius: 0, tension: 0.4 }}]
      }},
      options: {{ responsive: true, maintainAspectRatio: false, plugins: {{ legend: {{ display: false }} }} }}
    }});
  }}

  function changeTimeframe(index, timeframe, button) {{
    button.parentElement.querySelectorAll('.timeframe-btn').forEach(b => b.classList.remove('active'));
    button.classList.add('active');
    initChart(index, timeframe);
  }}

  function sortTable(column, kind) {{
    const body = document.getElementById('tableBody');
    const direction = currentSort.column === column && currentSort.direction === 'asc' ? 'desc' : 'asc';
    const value = row => {{
      const text = row.cells[column].textContent;
      if (kind === 'number') return parseFloat(text.replace(/[^0-9.-]/g, '')) || 0;
      if (kind === 'date') return new Date(text).getTime() || 0;
      return text.toLowerCase();
    }};
    const rows = Array.from(body.rows).sort((a, b) => {{
      const x = value(a), y = value(b);
      const order = x < y ? -1 : x > y ? 1 : 0;
      return direction === 'asc' ? order : -order;
    }});
    rows.forEach(row => body.appendChild(row));
    document.querySelectorAll('th.sortable').forEach((th, i) => {{
      th.classList.remove('sort-asc', 'sort-desc');
      if (i === column) th.classList.add(direction === 'asc' ? 'sort-asc' : 'sort-desc');
    }});
    currentSort = {{ column, direction }};
  }}

  function filterTable() {{
    const search = document.getElementById('searchBox').value.toLowerCase();
    const market = document.getElementById('marketFilter').value;
    const side = document.getElementById('sideFilter').value;
    let visible = 0;
    Array.from(document.getElementById('tableBody').rows).forEach(row => {{
      const show = row.textContent.toLowerCase().includes(search)
        && (!market || row.cells[0].textContent === market)
        && (!side || row.cells[1].textContent.toLowerCase() === side);
      row.style.display = show ? '' : 'none';
      if (show) visible++;
    }});
    document.getElementById('visibleRows').textContent = visible;
  }}

  chartData.forEach((_, index) => initChart(index, 'all'));
</script>"#,
        series = script_json(&series)?,
        generated_at = report.generated_at.timestamp_millis(),
    );

    Ok(page("Funding Analytics", &body, &scripts))
}
