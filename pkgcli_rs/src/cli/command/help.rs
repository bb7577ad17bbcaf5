//! Help text rendering for single commands and the whole catalog.

use std::fmt::Write as _;

use super::catalog::{OptionKind, OptionSpec};
use super::descriptor::CommandDescriptor;
use crate::cli::BINARY_NAME;
use crate::i18n::{Localizer, Msg};

/// Help for one command: usage, description, visible options and examples.
pub fn render_command_help(
    descriptor: &CommandDescriptor,
    markdown: bool,
    localizer: &Localizer,
) -> String {
    if markdown {
        render_command_markdown(descriptor, localizer)
    } else {
        render_command_plain(descriptor, localizer)
    }
}

/// Help for every listed command.
///
/// Hidden commands are never listed. Deprecated ones only appear with
/// `include_all`, marked and followed by their deprecation notice.
pub fn render_catalog_help<'a, I>(
    descriptors: I,
    include_all: bool,
    markdown: bool,
    localizer: &Localizer,
) -> String
where
    I: IntoIterator<Item = &'a CommandDescriptor>,
{
    let mut listed: Vec<&CommandDescriptor> = descriptors
        .into_iter()
        .filter(|d| !d.is_hidden() && (include_all || !d.is_deprecated()))
        .collect();
    listed.sort_by_key(|d| d.name().to_ascii_lowercase());

    if markdown {
        render_catalog_markdown(&listed, localizer)
    } else {
        render_catalog_plain(&listed, include_all, localizer)
    }
}

fn usage_line(descriptor: &CommandDescriptor) -> String {
    if descriptor.usage().is_empty() {
        format!("{} {} [options]", BINARY_NAME, descriptor.name())
    } else {
        format!(
            "{} {} {} [options]",
            BINARY_NAME,
            descriptor.name(),
            descriptor.usage()
        )
    }
}

fn version_line(localizer: &Localizer) -> String {
    localizer.format(
        Msg::HelpVersion,
        &[("binary", BINARY_NAME), ("version", env!("CARGO_PKG_VERSION"))],
    )
}

fn option_label(option: &OptionSpec) -> String {
    if option.aliases().is_empty() {
        format!("-{}", option.name())
    } else {
        format!("-{} ({})", option.name(), option.aliases().join(", "))
    }
}

fn option_text(option: &OptionSpec, localizer: &Localizer) -> String {
    let mut text = String::new();
    if option.is_deprecated() {
        text.push_str(localizer.text(Msg::DeprecatedMarker));
        text.push(' ');
    }
    text.push_str(option.description());
    if option.kind() == OptionKind::Multi {
        let _ = write!(text, " ({})", localizer.text(Msg::HelpMultiple));
    }
    if option.is_deprecated() {
        let notice = match option.replacement() {
            Some(replacement) => localizer.format(
                Msg::OptionDeprecatedUseInstead,
                &[("option", option.name()), ("replacement", replacement)],
            ),
            None => localizer.format(Msg::OptionDeprecated, &[("option", option.name())]),
        };
        let _ = write!(text, " {}", notice);
    }
    text
}

fn render_command_plain(descriptor: &CommandDescriptor, localizer: &Localizer) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}: {}",
        localizer.text(Msg::HelpUsage),
        usage_line(descriptor)
    );
    out.push('\n');
    let _ = writeln!(out, "{}", descriptor.description());
    if let Some(warning) = descriptor.deprecation_warning(localizer) {
        let _ = writeln!(out, "{} {}", localizer.text(Msg::DeprecatedMarker), warning);
    }

    let labels: Vec<(String, &OptionSpec)> = descriptor
        .catalog()
        .visible()
        .map(|option| (option_label(option), option))
        .collect();
    if !labels.is_empty() {
        let width = labels.iter().map(|(label, _)| label.len()).max().unwrap_or(0) + 2;
        out.push('\n');
        let _ = writeln!(out, "{}:", localizer.text(Msg::HelpOptions));
        out.push('\n');
        for (label, option) in &labels {
            let _ = writeln!(
                out,
                " {:<width$}{}",
                label,
                option_text(option, localizer),
                width = width
            );
        }
    }

    if !descriptor.examples().is_empty() {
        out.push('\n');
        let _ = writeln!(out, "{}:", localizer.text(Msg::HelpExamples));
        out.push('\n');
        for example in descriptor.examples() {
            let _ = writeln!(out, "{}", example);
        }
    }
    out
}

fn markdown_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

fn render_command_markdown(descriptor: &CommandDescriptor, localizer: &Localizer) -> String {
    let mut out = String::new();
    if descriptor.is_deprecated() {
        let _ = writeln!(
            out,
            "## {} {}",
            descriptor.name(),
            localizer.text(Msg::DeprecatedMarker)
        );
    } else {
        let _ = writeln!(out, "## {}", descriptor.name());
    }
    out.push('\n');
    let _ = writeln!(out, "{}", descriptor.description());
    if let Some(warning) = descriptor.deprecation_warning(localizer) {
        out.push('\n');
        let _ = writeln!(out, "> {}", warning);
    }
    out.push('\n');
    let _ = writeln!(out, "### {}", localizer.text(Msg::HelpUsage));
    out.push('\n');
    let _ = writeln!(out, "`{}`", usage_line(descriptor));

    let visible: Vec<&OptionSpec> = descriptor.catalog().visible().collect();
    if !visible.is_empty() {
        out.push('\n');
        let _ = writeln!(out, "### {}", localizer.text(Msg::HelpOptions));
        out.push('\n');
        out.push_str("| | |\n| --- | --- |\n");
        for option in visible {
            let aliases = option
                .aliases()
                .iter()
                .map(|alias| format!(" (`-{}`)", alias))
                .collect::<String>();
            let _ = writeln!(
                out,
                "| `-{}`{} | {} |",
                option.name(),
                aliases,
                markdown_cell(&option_text(option, localizer))
            );
        }
    }

    if !descriptor.examples().is_empty() {
        out.push('\n');
        let _ = writeln!(out, "### {}", localizer.text(Msg::HelpExamples));
        out.push('\n');
        out.push_str("```\n");
        for example in descriptor.examples() {
            let _ = writeln!(out, "{}", example);
        }
        out.push_str("```\n");
    }
    out
}

fn render_catalog_plain(
    listed: &[&CommandDescriptor],
    include_all: bool,
    localizer: &Localizer,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", version_line(localizer));
    let _ = writeln!(
        out,
        "{}: {} <command> [args] [options]",
        localizer.text(Msg::HelpUsage),
        BINARY_NAME
    );
    let _ = writeln!(
        out,
        "{}",
        localizer.format(Msg::HelpMoreInfo, &[("binary", BINARY_NAME)])
    );
    out.push('\n');
    let _ = writeln!(out, "{}", localizer.text(Msg::HelpAvailableCommands));
    out.push('\n');

    let width = listed.iter().map(|d| d.name().len()).max().unwrap_or(0) + 2;
    for descriptor in listed {
        let mut line = format!(" {:<width$}", descriptor.name(), width = width);
        if descriptor.is_deprecated() {
            line.push_str(localizer.text(Msg::DeprecatedMarker));
            line.push(' ');
        }
        line.push_str(descriptor.summary());
        if let Some(warning) = descriptor.deprecation_warning(localizer) {
            line.push(' ');
            line.push_str(&warning);
        }
        let _ = writeln!(out, "{}", line.trim_end());
    }

    if include_all {
        for descriptor in listed {
            out.push('\n');
            let _ = writeln!(out, "{}", "-".repeat(40));
            let _ = writeln!(out, "{}", descriptor.name());
            out.push('\n');
            out.push_str(&render_command_plain(descriptor, localizer));
        }
    }
    out
}

fn render_catalog_markdown(listed: &[&CommandDescriptor], localizer: &Localizer) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "# {} {}",
        BINARY_NAME,
        localizer.text(Msg::HelpReference)
    );
    out.push('\n');
    let _ = writeln!(out, "{}", version_line(localizer));
    for descriptor in listed {
        out.push('\n');
        out.push_str(&render_command_markdown(descriptor, localizer));
    }
    out
}
