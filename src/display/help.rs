//! Custom help formatting for consistent CLI display.

use crate::display::theme::Theme;
use console::style;

/// Format help text with consistent styling
pub fn format_help_section(title: &str, content: &str, indent: bool) -> String {
    let mut output = String::new();

    if Theme::should_disable_colors() {
        output.push_str(&format!("{title}\n"));
    } else {
        output.push_str(&format!("{}\n", style(title).cyan().bold()));
    }

    for line in content.lines() {
        if line.trim().is_empty() {
            output.push('\n');
        } else if indent && !line.starts_with("    ") {
            output.push_str(&format!("    {line}\n"));
        } else {
            output.push_str(&format!("{line}\n"));
        }
    }

    output
}

/// Examples appended to the top-level help
pub fn create_help_text() -> String {
    let mut help = String::new();

    let quick_start = r#"$ scopesync init                 # Write .scopesync/settings.toml
$ scopesync audit                # Cluster the whole backlog
$ scopesync query "Allow resetting password" --team Nova"#;
    help.push_str(&format_help_section("QUICK START", quick_start, true));
    help.push('\n');

    let examples = r#"# Tighter clusters, console only
$ scopesync audit --eps 0.4 --no-export

# Check a new ticket and add it to the store afterwards
$ scopesync query "Export invoices as PDF" --team Atlas --id ATL-77 --ingest

# Machine-readable output
$ scopesync audit --json | jq '.data.groups[].group.members[].id'

# Override settings from the environment
$ SCOPESYNC_QUERY__K=20 scopesync query "Login via SSO" --team Orion"#;
    help.push_str(&format_help_section("EXAMPLES", examples, true));

    help
}
