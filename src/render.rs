//! Server-rendered HTML pages.

use serde_json::Value;

use crate::catalog::{AccountRole, ListingKind, ALL_ACTIONS, ALL_CATEGORIES, ALL_PLATFORMS};
use crate::history::PriceHistory;
use crate::ranking::{ListingField, ListingRanking, RankingEntry, TokenRanking, ALL_TOKEN_FIELDS};
use crate::records::RecordReport;

const ECHARTS_SRC: &str = "https://cdn.jsdelivr.net/npm/echarts@5/dist/echarts.min.js";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashLevel {
    Danger,
    Warning,
}

impl FlashLevel {
    fn class(self) -> &'static str {
        match self {
            Self::Danger => "flash-danger",
            Self::Warning => "flash-warning",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

impl Flash {
    pub fn danger(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Danger,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Warning,
            message: message.into(),
        }
    }
}

pub fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn layout(title: &str, flashes: &[Flash], body: &str, with_charts: bool) -> String {
    let mut out = String::new();
    out.push_str("<!DOCTYPE html><html><head><meta charset=\"utf-8\">\n");
    out.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    out.push_str(&format!("<title>akaboard | {}</title>\n", escape_html(title)));
    out.push_str("<style>:root{--bg:#f4f4f6;--card:#ffffff;--ink:#1d1d24;--muted:#6a6a75;--line:#dcdce2;--head:#26263a;--accent:#ff9797}*{box-sizing:border-box}body{margin:0;color:var(--ink);font-family:\"Avenir Next\",\"Segoe UI\",sans-serif;background:var(--bg);min-height:100vh}nav{display:flex;gap:18px;align-items:center;background:var(--head);padding:12px 20px}nav a{color:#f4f4f6;text-decoration:none;font-weight:600}nav .brand{font-size:1.15rem;margin-right:12px}.shell{max-width:1200px;margin:0 auto;padding:20px 16px}.card{background:var(--card);border:1px solid var(--line);border-radius:12px;padding:16px 18px;margin-top:16px;box-shadow:0 6px 18px rgba(20,20,30,.08)}.flash{border-radius:8px;padding:10px 14px;margin-top:10px;font-weight:600}.flash-danger{background:#fde2e2;color:#8a1f1f}.flash-warning{background:#fff3cd;color:#7a5b00}form label{display:inline-block;margin:6px 14px 6px 0}form input[type=text],form input[type=date],form select{padding:6px 8px;border:1px solid var(--line);border-radius:6px}button{background:var(--accent);border:0;border-radius:8px;padding:8px 16px;font-weight:700;cursor:pointer}table{width:100%;border-collapse:collapse}th{background:var(--head);color:#f4f4f6;font-size:.82rem;text-align:left;padding:8px}td{padding:8px;font-size:.86rem;border-bottom:1px solid var(--line)}td img{width:64px;height:64px;object-fit:cover;border-radius:6px}.meta{color:var(--muted);font-size:.9rem}.chart{width:100%;height:460px}.pie{width:100%;height:360px}</style>\n");
    if with_charts {
        out.push_str(&format!("<script src=\"{ECHARTS_SRC}\"></script>\n"));
    }
    out.push_str("</head><body>\n");
    out.push_str("<nav><a class=\"brand\" href=\"/\">akaboard</a><a href=\"/ranking\">Ranking</a><a href=\"/history\">History</a><a href=\"/record\">Record</a></nav>\n");
    out.push_str("<main class=\"shell\">\n");
    for flash in flashes {
        out.push_str(&format!(
            "<div class=\"flash {}\">{}</div>\n",
            flash.level.class(),
            escape_html(&flash.message)
        ));
    }
    out.push_str(body);
    out.push_str("</main></body></html>\n");
    out
}

pub fn render_home() -> String {
    let body = "<section class=\"card\"><h1>akaboard</h1>\
<p>Rankings, price history and transaction records for tokens on the akaSwap marketplace.</p>\
<ul><li><a href=\"/ranking\">Rank a creator's or collector's tokens, or active gachas, auctions and bundles</a></li>\
<li><a href=\"/history\">Chart the price history of one token</a></li>\
<li><a href=\"/record\">List the transactions of an account</a></li></ul></section>\n";
    layout("Home", &[], body, false)
}

pub fn render_ranking_index() -> String {
    let mut body = String::from("<section class=\"card\"><h1>Ranking</h1><ul>");
    for (path, label) in [
        ("creation", "Creation"),
        ("collection", "Collection"),
        ("gacha", "Gacha"),
        ("auction", "Auction"),
        ("bundle", "Bundle"),
    ] {
        body.push_str(&format!(
            "<li><a href=\"/ranking/{path}\">{label}</a></li>"
        ));
    }
    body.push_str("</ul></section>\n");
    layout("Ranking", &[], &body, false)
}

fn direction_inputs(out: &mut String) {
    out.push_str("<label><input type=\"radio\" name=\"direction\" value=\"desc\" checked> Descending</label>");
    out.push_str("<label><input type=\"radio\" name=\"direction\" value=\"asc\"> Ascending</label>");
}

fn option_select(out: &mut String, options: &[(&str, &str)]) {
    out.push_str("<label>Rank by <select name=\"option\"><option value=\"\">--</option>");
    for (key, title) in options {
        out.push_str(&format!(
            "<option value=\"{}\">{}</option>",
            escape_html(key),
            escape_html(title)
        ));
    }
    out.push_str("</select></label>");
}

fn platform_checkboxes(out: &mut String) {
    for platform in ALL_PLATFORMS {
        out.push_str(&format!(
            "<label><input type=\"checkbox\" name=\"platform\" value=\"{}\" checked> {}</label>",
            platform.slug(),
            escape_html(platform.display_name())
        ));
    }
}

fn ranking_table(out: &mut String, entries: &[RankingEntry], id_label: &str, unit: &str) {
    let with_platform = entries.iter().any(|entry| entry.platform.is_some());
    let with_option = entries.iter().any(|entry| entry.option.is_some());

    out.push_str("<table><thead><tr><th>Rank</th><th>Photo</th>");
    out.push_str(&format!("<th>{}</th><th>Name</th>", escape_html(id_label)));
    if with_platform {
        out.push_str("<th>Platform</th>");
    }
    if with_option {
        out.push_str(&format!("<th>{}</th>", escape_html(unit)));
    }
    out.push_str("</tr></thead><tbody>\n");

    for entry in entries {
        out.push_str(&format!(
            "<tr style=\"background:{}\"><td>{}</td><td>",
            entry.color, entry.rank
        ));
        if let Some(photo) = &entry.photo {
            out.push_str(&format!("<img src=\"{}\" alt=\"\">", escape_html(photo)));
        }
        out.push_str(&format!(
            "</td><td>{}</td><td><a href=\"{}\" target=\"_blank\">{}</a></td>",
            escape_html(&entry.id),
            escape_html(&entry.url),
            escape_html(&entry.name)
        ));
        if with_platform {
            out.push_str(&format!(
                "<td>{}</td>",
                escape_html(entry.platform.unwrap_or(""))
            ));
        }
        if with_option {
            out.push_str(&format!(
                "<td>{}</td>",
                escape_html(entry.option.as_deref().unwrap_or(""))
            ));
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</tbody></table>");
}

pub fn render_account_ranking(
    role: AccountRole,
    flashes: &[Flash],
    ranking: Option<&TokenRanking>,
) -> String {
    let title = format!("{} Ranking", role.target_label());
    let mut body = format!(
        "<section class=\"card\"><h1>{}</h1><form method=\"post\" action=\"/ranking/{}\">",
        escape_html(&title),
        role.target()
    );
    body.push_str(&format!(
        "<label>{} <input type=\"text\" name=\"address\" placeholder=\"tz1...\"></label><br>",
        role.label()
    ));
    let options: Vec<(&str, &str)> = ALL_TOKEN_FIELDS
        .iter()
        .filter(|field| role == AccountRole::Collector || !field.collection_only())
        .map(|field| (field.key(), field.title()))
        .collect();
    option_select(&mut body, &options);
    direction_inputs(&mut body);
    body.push_str("<br>");
    platform_checkboxes(&mut body);
    body.push_str("<br><button type=\"submit\">Rank</button></form></section>\n");

    if let Some(ranking) = ranking {
        body.push_str(&format!(
            "<section class=\"card\"><h2>{}: <a href=\"{}\" target=\"_blank\">{}</a></h2>",
            ranking.owner_label,
            escape_html(&ranking.profile_url),
            escape_html(&ranking.owner_name)
        ));
        body.push_str(&format!(
            "<p class=\"meta\">Ranked by {} at {}</p>",
            escape_html(ranking.title),
            escape_html(&ranking.generated_at)
        ));
        ranking_table(&mut body, &ranking.entries, "Token ID", ranking.unit);
        body.push_str("</section>\n");
    }

    layout(&title, flashes, &body, false)
}

pub fn render_listing_ranking(
    kind: ListingKind,
    flashes: &[Flash],
    ranking: Option<&ListingRanking>,
) -> String {
    let title = format!("{} Ranking", kind.label());
    let mut body = format!(
        "<section class=\"card\"><h1>{}</h1><form method=\"post\" action=\"/ranking/{}\">",
        escape_html(&title),
        kind.as_str()
    );
    let options: Vec<(&str, &str)> = ListingField::fields_for(kind)
        .map(|def| (def.key, def.title))
        .collect();
    option_select(&mut body, &options);
    direction_inputs(&mut body);
    if kind == ListingKind::Gacha {
        body.push_str("<label>Expired <select name=\"exclude_expired\"><option value=\"\">--</option><option value=\"true\">Exclude</option><option value=\"false\">Include</option></select></label>");
    }
    body.push_str("<br><button type=\"submit\">Rank</button></form></section>\n");

    if let Some(ranking) = ranking {
        body.push_str(&format!(
            "<section class=\"card\"><h2>Active {}</h2><p class=\"meta\">Ranked by {} at {}</p>",
            kind.plural(),
            escape_html(ranking.title),
            escape_html(&ranking.generated_at)
        ));
        ranking_table(
            &mut body,
            &ranking.entries,
            &format!("{} ID", kind.label()),
            ranking.unit,
        );
        body.push_str("</section>\n");
    }

    layout(&title, flashes, &body, false)
}

/// Inline script payload; `</` is escaped so the JSON cannot close the tag.
fn chart_script(element_id: &str, option: &Value) -> String {
    let json = option.to_string().replace("</", "<\\/");
    format!(
        "<div id=\"{element_id}\" class=\"{}\"></div><script>echarts.init(document.getElementById('{element_id}')).setOption({json});</script>",
        if element_id == "owner-pie" { "pie" } else { "chart" }
    )
}

pub fn render_history(flashes: &[Flash], history: Option<&PriceHistory>) -> String {
    let mut body = String::from(
        "<section class=\"card\"><h1>Price History</h1><form method=\"post\" action=\"/history\">\
<label>Token ID <input type=\"text\" name=\"token_id\"></label><label>Platform <select name=\"platform\">",
    );
    for platform in ALL_PLATFORMS {
        body.push_str(&format!(
            "<option value=\"{}\">{}</option>",
            platform.slug(),
            escape_html(platform.display_name())
        ));
    }
    body.push_str("</select></label><button type=\"submit\">Search</button></form></section>\n");

    if let Some(history) = history {
        body.push_str(&format!(
            "<section class=\"card\"><h2><a href=\"{}\" target=\"_blank\">{}</a></h2><p class=\"meta\">Generated at {}</p>",
            escape_html(&history.url),
            escape_html(&history.name),
            escape_html(&history.generated_at)
        ));
        if let Some(photo) = &history.photo {
            body.push_str(&format!(
                "<img src=\"{}\" alt=\"\" style=\"max-width:320px;border-radius:8px\">",
                escape_html(photo)
            ));
        }
        body.push_str("<table><tbody>");
        for (label, value) in history.summary.rows() {
            body.push_str(&format!(
                "<tr><th>{label}</th><td>{}</td></tr>",
                escape_html(&value)
            ));
        }
        body.push_str("</tbody></table>");
        if let Some(chart) = history.chart_option() {
            body.push_str(&chart_script("price-chart", &chart));
        }
        if let Some(pie) = history.owner_option() {
            body.push_str(&chart_script("owner-pie", &pie));
        }
        body.push_str("</section>\n");
    }

    layout("History", flashes, &body, history.is_some())
}

pub fn render_records(
    default_start: &str,
    default_end: &str,
    flashes: &[Flash],
    report: Option<&RecordReport>,
) -> String {
    let mut body = String::from(
        "<section class=\"card\"><h1>Transaction Record</h1><form method=\"post\" action=\"/record\">\
<label>User <input type=\"text\" name=\"address\" placeholder=\"tz1...\"></label>",
    );
    body.push_str(&format!(
        "<label>Start <input type=\"date\" name=\"start_date\" value=\"{}\"></label><label>End <input type=\"date\" name=\"end_date\" value=\"{}\"></label><br>",
        escape_html(default_start),
        escape_html(default_end)
    ));
    platform_checkboxes(&mut body);
    body.push_str("<br>");
    for category in ALL_CATEGORIES {
        body.push_str(&format!(
            "<label><input type=\"checkbox\" name=\"category\" value=\"{0}\" checked> {0}</label>",
            category.as_str()
        ));
    }
    body.push_str("<br>");
    for action in ALL_ACTIONS {
        body.push_str(&format!(
            "<label><input type=\"checkbox\" name=\"action\" value=\"{0}\" checked> {0}</label>",
            action.as_str()
        ));
    }
    body.push_str("<br><button type=\"submit\">Search</button></form></section>\n");

    if let Some(report) = report {
        body.push_str(&format!(
            "<section class=\"card\"><h2><a href=\"{}\" target=\"_blank\">{}</a></h2><p class=\"meta\">{} to {}, generated at {}</p>",
            escape_html(&report.profile_url),
            escape_html(&report.user),
            escape_html(&report.start_date),
            escape_html(&report.end_date),
            escape_html(&report.generated_at)
        ));
        body.push_str("<table><thead><tr><th>Time</th><th>Platform</th><th>From</th><th>To</th><th>Token</th><th>Action</th><th>Amount</th><th>Price</th></tr></thead><tbody>\n");
        for row in &report.records {
            body.push_str(&format!(
                "<tr style=\"background:{}\"><td>{}</td><td>{}</td><td><a href=\"{}\" target=\"_blank\">{}</a></td><td><a href=\"{}\" target=\"_blank\">{}</a></td><td><a href=\"{}\" target=\"_blank\">{}</a></td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                row.color,
                escape_html(&row.time),
                escape_html(row.platform),
                escape_html(&row.from_url),
                escape_html(&row.from),
                escape_html(&row.to_url),
                escape_html(&row.to),
                escape_html(&row.token_url),
                escape_html(&row.token),
                escape_html(&row.action),
                escape_html(&row.amount),
                escape_html(&row.price)
            ));
        }
        body.push_str("</tbody></table></section>\n");
    }

    layout("Record", flashes, &body, false)
}
