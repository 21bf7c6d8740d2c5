//! CLI display utilities for formatting output
//!
//! Formatting functions return strings so they can be tested without a
//! terminal; colouring goes through [`StyleRole`].

use crate::core::styles::StyleRole;
use crate::rollback::api::RollbackResult;
use crate::updater::api::{compare_versions, NoUpdateReason, PluginInfo, UpdateDecision, TRUNK};
use prettytable::{format, Cell, Row, Table};

const KEY_WIDTH: usize = 14;

fn key_line(out: &mut String, key: &str, value: &str, use_color: bool) {
    let padded = format!("{:<width$}", format!("{}:", key), width = KEY_WIDTH);
    out.push_str(&format!(
        "  {} {}\n",
        StyleRole::Key.paint(&padded, use_color),
        StyleRole::Value.paint(value, use_color)
    ));
}

fn opt_line(out: &mut String, key: &str, value: &Option<String>, use_color: bool) {
    if let Some(value) = value {
        key_line(out, key, value, use_color);
    }
}

/// Human-readable summary of an update decision
pub fn format_decision(decision: &UpdateDecision, use_color: bool) -> String {
    let mut out = String::new();
    match decision {
        UpdateDecision::UpdateAvailable(offer) => {
            out.push_str(&format!(
                "{} {} {} -> {}\n",
                StyleRole::Header.paint("Update available:", use_color),
                offer.slug,
                offer.current_version,
                StyleRole::Valid.paint(&offer.new_version, use_color)
            ));
            key_line(
                &mut out,
                "Package",
                offer.package.as_deref().unwrap_or("(none)"),
                use_color,
            );
            opt_line(&mut out, "Homepage", &offer.url, use_color);
            opt_line(&mut out, "Tested up to", &offer.tested, use_color);
            opt_line(&mut out, "Requires", &offer.requires, use_color);
            opt_line(&mut out, "Requires PHP", &offer.requires_php, use_color);
        }
        UpdateDecision::NoUpdate(none) => {
            let message = match none.reason {
                NoUpdateReason::UpToDate => format!(
                    "Up to date: version {} is installed",
                    none.current_version
                ),
                NoUpdateReason::NoNewVersion => format!(
                    "No version offered by the update server (installed: {})",
                    none.current_version
                ),
                NoUpdateReason::FetchFailed => format!(
                    "Update server unavailable; no update information (installed: {})",
                    none.current_version
                ),
            };
            let role = match none.reason {
                NoUpdateReason::FetchFailed => StyleRole::Invalid,
                _ => StyleRole::Valid,
            };
            out.push_str(&role.paint(&message, use_color));
            out.push('\n');
            if let Some(offered) = &none.offered_version {
                key_line(&mut out, "Offered", offered, use_color);
            }
        }
    }
    out
}

/// Plugin details, without the version catalog
pub fn format_info(info: &PluginInfo, use_color: bool) -> String {
    let mut out = format!(
        "{} {}\n",
        StyleRole::Header.paint(&info.name, use_color),
        info.version
    );
    key_line(&mut out, "Slug", &info.slug, use_color);
    opt_line(&mut out, "Author", &info.author, use_color);
    opt_line(&mut out, "Homepage", &info.homepage, use_color);
    opt_line(&mut out, "Requires", &info.requires, use_color);
    opt_line(&mut out, "Tested up to", &info.tested, use_color);
    opt_line(&mut out, "Requires PHP", &info.requires_php, use_color);
    opt_line(&mut out, "Last updated", &info.last_updated, use_color);
    opt_line(&mut out, "Download", &info.download_link, use_color);
    if info.num_ratings > 0 {
        key_line(
            &mut out,
            "Rating",
            &format!("{}% ({} ratings)", info.rating, info.num_ratings),
            use_color,
        );
    }
    if info.active_installs > 0 {
        key_line(
            &mut out,
            "Installs",
            &info.active_installs.to_string(),
            use_color,
        );
    }
    if !info.tags.is_empty() {
        let tags: Vec<&str> = info.tags.values().map(String::as_str).collect();
        key_line(&mut out, "Tags", &tags.join(", "), use_color);
    }
    if !info.sections.is_empty() {
        let sections: Vec<&str> = info.sections.keys().map(String::as_str).collect();
        key_line(&mut out, "Sections", &sections.join(", "), use_color);
    }
    key_line(
        &mut out,
        "Rollback",
        if info.allow_rollback { "allowed" } else { "not offered" },
        use_color,
    );
    out
}

/// Version catalog as a table, or `None` when nothing can be rolled back to
pub fn versions_table(info: &PluginInfo, use_color: bool) -> Option<Table> {
    if info.versions.is_empty() {
        return None;
    }

    let styled = |text: &str, role: StyleRole| {
        let cell = Cell::new(text);
        match role.to_prettytable_spec().filter(|_| use_color) {
            Some(spec) => cell.style_spec(&spec),
            None => cell,
        }
    };

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_CLEAN);
    table.set_titles(Row::new(vec![
        styled("Version", StyleRole::Header),
        styled("Package", StyleRole::Header),
    ]));
    // Newest first, trunk last
    let mut versions: Vec<(&String, &String)> = info.versions.iter().collect();
    versions.sort_by(|a, b| {
        (a.0.as_str() == TRUNK)
            .cmp(&(b.0.as_str() == TRUNK))
            .then_with(|| compare_versions(b.0, a.0))
    });
    for (version, package) in versions {
        table.add_row(Row::new(vec![
            styled(version, StyleRole::Key),
            styled(package, StyleRole::Value),
        ]));
    }
    Some(table)
}

/// Outcome of a rollback, including the state trail when present
pub fn format_rollback(result: &RollbackResult, use_color: bool) -> String {
    let mut out = String::new();
    if result.success {
        out.push_str(&StyleRole::Valid.paint(&result.message, use_color));
        out.push('\n');
        if let Some(code) = result.error_code {
            key_line(&mut out, "Warning", code.as_ref(), use_color);
        }
    } else {
        let code = result.error_code.map(|c| c.to_string()).unwrap_or_default();
        out.push_str(&format!(
            "{} [{}] {}\n",
            StyleRole::Error.paint("Rollback failed", use_color),
            code,
            result.message
        ));
    }
    key_line(&mut out, "Installed", &result.current_version, use_color);
    key_line(&mut out, "Requested", &result.target_version, use_color);
    if let Some(trace) = &result.debug_trace {
        out.push_str(&StyleRole::Header.paint("Trace:", use_color));
        out.push('\n');
        for line in trace {
            out.push_str(&format!("  {}\n", StyleRole::Dim.paint(line, use_color)));
        }
    }
    out
}

/// Print the details view and its version table
pub fn print_info(info: &PluginInfo, use_color: bool) {
    print!("{}", format_info(info, use_color));
    if let Some(table) = versions_table(info, use_color) {
        println!();
        if use_color {
            table.printstd();
        } else {
            print!("{}", table);
        }
    }
}
