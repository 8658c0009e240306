pub use fluent_templates::fluent_bundle::FluentValue;
pub use fluent_templates::{LanguageIdentifier, Loader};
use std::sync::OnceLock;

fluent_templates::static_loader! {
    pub static LOCALES = {
        locales: "./locales",
        fallback_language: "en-US",
        // keep arguments free of Unicode isolation marks, the output is a plain terminal
        customise: |bundle| bundle.set_use_isolating(false),
    };
}

pub const DEFAULT_LANGUAGE: &str = "en-US";

static LANGUAGE: OnceLock<LanguageIdentifier> = OnceLock::new();

/// Selects the language of all later lookups. Only the first call has an effect.
pub fn set_language(language: LanguageIdentifier) {
    if LANGUAGE.set(language).is_err() {
        log::debug!("Language was already selected, ignoring change");
    }
}

pub fn language() -> &'static LanguageIdentifier {
    LANGUAGE.get_or_init(|| DEFAULT_LANGUAGE.parse().unwrap_or_default())
}

macro_rules! localize {
    // Case 1: No arguments provided
    ( $text_id:expr ) => {{
        use $crate::localization::Loader as _;
        $crate::localization::LOCALES.lookup($crate::localization::language(), $text_id)
    }};

    // Case 2: One or more arguments provided
    ( $text_id:expr, $( $arg_name:ident: $arg_value:expr ),* $(,)? ) => {{
        use $crate::localization::Loader as _;
        let args = std::collections::HashMap::from_iter([
            $(  // key-value pair (Cow<str>, FluentValue::String)
                (std::borrow::Cow::from(stringify!($arg_name)),
                $crate::localization::FluentValue::String($arg_value.to_string().into()))
            ),*
        ]);
        $crate::localization::LOCALES.lookup_with_args($crate::localization::language(), $text_id, &args)
    }};
}

pub(crate) use localize;
