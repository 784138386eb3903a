//! Dashboard page with plotly.js charts

use std::io::{self, Write};

/// Replaced with the embedded payload, or left as `null` for the live page
pub const DATA_PLACEHOLDER: &str = "/*__ENGAGEDASH_DATA__*/null";

/// Write the page. With `embedded` the data is baked in and the filter
/// controls are read-only; without it the page talks to the JSON API.
pub fn write<W: Write>(writer: &mut W, embedded: Option<&str>) -> io::Result<()> {
    let page = match embedded {
        Some(json) => PAGE.replace(DATA_PLACEHOLDER, &script_safe(json)),
        None => PAGE.to_string(),
    };
    writer.write_all(page.as_bytes())
}

/// The live page served at `/`
pub fn live_page() -> String {
    PAGE.to_string()
}

/// Keep embedded JSON from closing the surrounding script tag or opening a
/// comment. `<` only occurs inside JSON strings, where `\u003c` reads the same.
fn script_safe(json: &str) -> String {
    json.replace('<', "\\u003c")
}

const PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Student Engagement Dashboard</title>
    <script src="https://cdn.plot.ly/plotly-2.35.2.min.js"></script>
    <style>
        :root {
            --bg: #f5f5f7;
            --card: #ffffff;
            --border: #d2d2d7;
            --text: #1d1d1f;
            --dim: #86868b;
            --low: #ff3b30;
            --medium: #ff9f0a;
            --high: #34c759;
            --accent: #007aff;
            --shadow: 0 2px 8px rgba(0,0,0,0.08), 0 1px 2px rgba(0,0,0,0.04);
        }
        * { box-sizing: border-box; margin: 0; padding: 0; }
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Helvetica Neue', Helvetica, Arial, sans-serif;
            background: var(--bg);
            color: var(--text);
            line-height: 1.5;
        }
        .layout { display: grid; grid-template-columns: 260px 1fr; min-height: 100vh; }
        aside {
            background: var(--card);
            border-right: 1px solid var(--border);
            padding: 1.5rem 1rem;
            overflow-y: auto;
        }
        aside h2 { font-size: 1rem; margin-bottom: 1rem; }
        details { margin-bottom: 0.75rem; }
        summary { cursor: pointer; font-weight: 600; font-size: 0.875rem; }
        label { display: block; font-size: 0.8125rem; padding: 0.125rem 0 0.125rem 0.5rem; }
        button {
            margin-top: 1rem;
            width: 100%;
            padding: 0.5rem;
            border: none;
            border-radius: 8px;
            background: var(--accent);
            color: white;
            font-weight: 600;
            cursor: pointer;
        }
        button:disabled { background: var(--dim); cursor: default; }
        main { padding: 2rem; }
        .header { margin-bottom: 1.5rem; }
        .header h1 { font-size: 1.75rem; letter-spacing: -0.02em; }
        .subtitle { color: var(--dim); font-size: 0.875rem; }
        .kpis { display: grid; grid-template-columns: repeat(5, 1fr); gap: 1rem; margin-bottom: 1.5rem; }
        .kpi { background: var(--card); border-radius: 12px; padding: 1rem; box-shadow: var(--shadow); }
        .kpi .value { font-size: 1.5rem; font-weight: 700; }
        .kpi .name { color: var(--dim); font-size: 0.75rem; text-transform: uppercase; letter-spacing: 0.04em; }
        .charts { display: grid; grid-template-columns: 1fr 1fr; gap: 1rem; margin-bottom: 1.5rem; }
        .chart { background: var(--card); border-radius: 12px; box-shadow: var(--shadow); min-height: 360px; }
        .warning {
            background: #fff4e5;
            border: 1px solid var(--medium);
            border-radius: 12px;
            padding: 1rem;
            margin-bottom: 1.5rem;
        }
        .preview { background: var(--card); border-radius: 12px; box-shadow: var(--shadow); overflow-x: auto; }
        table { border-collapse: collapse; width: 100%; font-size: 0.75rem; }
        th, td { padding: 0.375rem 0.5rem; border-bottom: 1px solid var(--border); text-align: left; white-space: nowrap; }
        th { position: sticky; top: 0; background: var(--card); }
        .hidden { display: none; }
    </style>
</head>
<body>
<div class="layout">
    <aside>
        <h2>Filters</h2>
        <div id="filters"></div>
        <button id="reset">Reset filters</button>
    </aside>
    <main>
        <div class="header">
            <h1>Student Engagement Dashboard</h1>
            <div class="subtitle" id="subtitle"></div>
        </div>
        <div class="warning hidden" id="warning"></div>
        <div id="content">
            <div class="kpis" id="kpis"></div>
            <div class="charts">
                <div class="chart" id="chart-0"></div>
                <div class="chart" id="chart-1"></div>
                <div class="chart" id="chart-2"></div>
                <div class="chart" id="chart-3"></div>
            </div>
            <h3 id="preview-title"></h3>
            <div class="preview"><table id="preview"></table></div>
        </div>
    </main>
</div>
<script>
const EMBEDDED = /*__ENGAGEDASH_DATA__*/null;
const COLORS = { L: '#ff3b30', M: '#ff9f0a', H: '#34c759' };
const color = cls => COLORS[cls] || '#8e8e93';
let filters = [];

// Data values only ever reach the page as text nodes
function el(tag, className, text) {
    const node = document.createElement(tag);
    if (className) node.className = className;
    if (text !== undefined) node.textContent = String(text);
    return node;
}

const fmt = (v, digits) => v === null || v === undefined ? 'n/a' : Number(v).toFixed(digits);

function renderFilters(readOnly) {
    const root = document.getElementById('filters');
    root.innerHTML = '';
    filters.forEach(f => {
        const details = document.createElement('details');
        details.open = f.selected.length !== f.options.length;
        const summary = document.createElement('summary');
        summary.textContent = `${f.label} (${f.selected.length}/${f.options.length})`;
        details.appendChild(summary);
        f.options.forEach(opt => {
            const label = document.createElement('label');
            const box = document.createElement('input');
            box.type = 'checkbox';
            box.checked = f.selected.includes(opt);
            box.disabled = readOnly;
            box.onchange = () => {
                f.selected = box.checked ? [...f.selected, opt] : f.selected.filter(s => s !== opt);
                summary.textContent = `${f.label} (${f.selected.length}/${f.options.length})`;
                refresh();
            };
            label.appendChild(box);
            label.append(' ' + opt);
            details.appendChild(label);
        });
        root.appendChild(details);
    });
    document.getElementById('reset').disabled = readOnly;
}

function query() {
    const params = new URLSearchParams();
    filters.forEach(f => {
        if (f.selected.length === f.options.length) return;
        if (f.selected.length === 0) params.append(f.key, '');
        f.selected.forEach(s => params.append(f.key, s));
    });
    return params.toString();
}

function renderKpis(k) {
    const items = [
        ['Students', k.students],
        ['Mean engagement', fmt(k.mean_engagement, 2)],
        ['Median engagement', fmt(k.median_engagement, 2)],
        ['Most common topic', k.most_common_topic ?? 'n/a'],
        ['Most common class', k.most_common_class ?? 'n/a'],
        ['Engagement vs class r', fmt(k.engagement_class_corr, 3)],
        ['Absent 7+ days', k.absence_above_7_share === null ? 'n/a' : (k.absence_above_7_share * 100).toFixed(1) + '%'],
    ];
    const root = document.getElementById('kpis');
    root.replaceChildren(...items.map(([name, value]) => {
        const card = el('div', 'kpi');
        card.append(el('div', 'value', value), el('div', 'name', name));
        return card;
    }));
}

function histogram(c) {
    const edges = c.bin_edges;
    const centers = edges.slice(0, -1).map((e, i) => (e + edges[i + 1]) / 2);
    const width = edges.length > 1 ? edges[1] - edges[0] : 1;
    const traces = c.series.map(s => ({
        type: 'bar', name: s.class, x: centers, y: s.counts, width: width,
        opacity: c.opacity, marker: { color: color(s.class) },
    }));
    return [traces, { barmode: 'overlay', xaxis: { title: c.x_label }, yaxis: { title: 'Students' } }];
}

function boxPlot(c) {
    const traces = c.groups.map(g => ({
        type: 'box', name: g.class, x: [g.class],
        q1: [g.q1], median: [g.median], q3: [g.q3],
        lowerfence: [g.whisker_low], upperfence: [g.whisker_high],
        marker: { color: color(g.class) },
    }));
    c.groups.filter(g => g.outliers.length).forEach(g => traces.push({
        type: 'scatter', mode: 'markers', showlegend: false,
        x: g.outliers.map(() => g.class), y: g.outliers, marker: { color: color(g.class) },
    }));
    return [traces, { yaxis: { title: 'Engagement score' } }];
}

function barChart(c) {
    return [[{
        type: 'bar', x: c.bars.map(b => b.label), y: c.bars.map(b => b.value),
        marker: { color: '#007aff' },
    }], { yaxis: { title: 'Mean engagement' } }];
}

function scatter(c) {
    const traces = [];
    c.series.forEach(s => {
        traces.push({
            type: 'scatter', mode: 'markers', name: s.class,
            x: s.points.map(p => p[0]), y: s.points.map(p => p[1]),
            marker: { color: color(s.class), opacity: 0.7 },
        });
        if (s.trend) {
            const t = s.trend;
            traces.push({
                type: 'scatter', mode: 'lines', name: s.class + ' trend', showlegend: false,
                x: [t.x_min, t.x_max],
                y: [t.intercept + t.slope * t.x_min, t.intercept + t.slope * t.x_max],
                line: { color: color(s.class) },
            });
        }
    });
    return [traces, { xaxis: { title: c.x_label }, yaxis: { title: c.y_label } }];
}

const BUILDERS = { histogram, box_plot: boxPlot, bar: barChart, scatter };

function renderCharts(charts) {
    charts.forEach((c, i) => {
        const [traces, layout] = BUILDERS[c.kind](c);
        layout.title = c.title;
        layout.margin = { t: 48, r: 16, b: 48, l: 56 };
        Plotly.react('chart-' + i, traces, layout, { displayModeBar: false, responsive: true });
    });
}

function renderPreview(p) {
    document.getElementById('preview-title').textContent =
        `Preview (${p.rows.length} of ${p.total_rows} rows)`;
    const head = el('tr');
    head.append(...p.headers.map(h => el('th', null, h)));
    const rows = p.rows.map(r => {
        const tr = el('tr');
        tr.append(...r.map(v => el('td', null, v === null ? '' : v)));
        return tr;
    });
    document.getElementById('preview').replaceChildren(head, ...rows);
}

function render(snapshot) {
    const warning = document.getElementById('warning');
    const content = document.getElementById('content');
    if (snapshot.status === 'no_matches') {
        warning.textContent = snapshot.message;
        warning.classList.remove('hidden');
        content.classList.add('hidden');
        return;
    }
    warning.classList.add('hidden');
    content.classList.remove('hidden');
    renderKpis(snapshot.kpis);
    renderCharts(snapshot.charts);
    renderPreview(snapshot.preview);
}

async function refresh() {
    const res = await fetch('/api/dashboard?' + query());
    const body = await res.json();
    if (!body.ok) {
        document.getElementById('warning').textContent = body.error;
        document.getElementById('warning').classList.remove('hidden');
        return;
    }
    render(body.data.snapshot);
}

async function init() {
    if (EMBEDDED) {
        filters = EMBEDDED.filters;
        document.getElementById('subtitle').textContent =
            `${EMBEDDED.source} · generated ${EMBEDDED.generated_at}`;
        renderFilters(true);
        render(EMBEDDED.snapshot);
        return;
    }
    const res = await fetch('/api/filters');
    const body = await res.json();
    filters = body.data.filters;
    document.getElementById('subtitle').textContent = body.data.source;
    renderFilters(false);
    document.getElementById('reset').onclick = () => {
        filters.forEach(f => { f.selected = [...f.options]; });
        renderFilters(false);
        refresh();
    };
    refresh();
}

init();
</script>
</body>
</html>
"#;
