//! Deprecation warnings for options that still work but have a successor.
//!
//! Warnings go through the console, so `-Verbosity quiet` silences them.

use crate::cli::parser::DeprecatedOption;
use crate::console::Console;
use crate::i18n::{Localizer, Msg};

pub fn option_warning(option: &DeprecatedOption, localizer: &Localizer) -> String {
    match option.replacement.as_deref() {
        Some(replacement) => localizer.format(
            Msg::OptionDeprecatedUseInstead,
            &[("option", option.name.as_str()), ("replacement", replacement)],
        ),
        None => localizer.format(Msg::OptionDeprecated, &[("option", option.name.as_str())]),
    }
}

pub fn warn_deprecated_options(
    console: &dyn Console,
    options: &[DeprecatedOption],
    localizer: &Localizer,
) {
    for option in options {
        console.warning(&option_warning(option, localizer));
    }
}
