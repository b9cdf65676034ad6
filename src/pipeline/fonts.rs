//! Font-hint handling.
//!
//! Extracted font names are whatever the producer embedded (`ABCDEF+Arial-BoldMT`,
//! `TimesNewRomanPSMT`, `helv`, …). The output PDF only uses the standard
//! fonts every reader ships, so a hint is mapped onto the closest standard
//! face by family and style keywords. A hint that matches nothing takes the
//! configured fallback, and a fallback that matches nothing is Helvetica.
//! Resolution never fails.

use pdfium_render::prelude::PdfFontBuiltin;

/// The standard faces the renderer draws with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
    HelveticaBoldOblique,
    TimesRoman,
    TimesBold,
    TimesItalic,
    TimesBoldItalic,
    Courier,
    CourierBold,
    CourierOblique,
    CourierBoldOblique,
}

#[derive(Clone, Copy)]
enum Family {
    Sans,
    Serif,
    Mono,
}

impl StandardFont {
    fn from_parts(family: Family, bold: bool, italic: bool) -> Self {
        use StandardFont::*;
        match (family, bold, italic) {
            (Family::Sans, false, false) => Helvetica,
            (Family::Sans, true, false) => HelveticaBold,
            (Family::Sans, false, true) => HelveticaOblique,
            (Family::Sans, true, true) => HelveticaBoldOblique,
            (Family::Serif, false, false) => TimesRoman,
            (Family::Serif, true, false) => TimesBold,
            (Family::Serif, false, true) => TimesItalic,
            (Family::Serif, true, true) => TimesBoldItalic,
            (Family::Mono, false, false) => Courier,
            (Family::Mono, true, false) => CourierBold,
            (Family::Mono, false, true) => CourierOblique,
            (Family::Mono, true, true) => CourierBoldOblique,
        }
    }

    /// The pdfium built-in this face corresponds to.
    pub fn builtin(self) -> PdfFontBuiltin {
        use StandardFont::*;
        match self {
            Helvetica => PdfFontBuiltin::Helvetica,
            HelveticaBold => PdfFontBuiltin::HelveticaBold,
            HelveticaOblique => PdfFontBuiltin::HelveticaOblique,
            HelveticaBoldOblique => PdfFontBuiltin::HelveticaBoldOblique,
            TimesRoman => PdfFontBuiltin::TimesRoman,
            TimesBold => PdfFontBuiltin::TimesBold,
            TimesItalic => PdfFontBuiltin::TimesItalic,
            TimesBoldItalic => PdfFontBuiltin::TimesBoldItalic,
            Courier => PdfFontBuiltin::Courier,
            CourierBold => PdfFontBuiltin::CourierBold,
            CourierOblique => PdfFontBuiltin::CourierOblique,
            CourierBoldOblique => PdfFontBuiltin::CourierBoldOblique,
        }
    }
}

/// Strip a subset tag (`ABCDEF+`) and surrounding whitespace.
pub fn normalize_font_name(raw: &str) -> String {
    let name = raw.trim();
    match name.split_once('+') {
        Some((tag, rest))
            if tag.len() == 6 && tag.chars().all(|c| c.is_ascii_uppercase()) =>
        {
            rest.trim().to_string()
        }
        _ => name.to_string(),
    }
}

/// Map a font hint to a standard face, if its family is recognisable.
pub fn match_standard_font(hint: &str) -> Option<StandardFont> {
    let name = normalize_font_name(hint).to_ascii_lowercase();
    if name.is_empty() {
        return None;
    }

    let family = if ["courier", "mono", "consol", "menlo", "cour"]
        .iter()
        .any(|k| name.contains(k))
    {
        Family::Mono
    } else if ["helv", "arial", "sans", "verdana", "calibri", "tahoma"]
        .iter()
        .any(|k| name.contains(k))
    {
        Family::Sans
    } else if ["times", "serif", "roman", "georgia", "garamond", "cambria", "tiro"]
        .iter()
        .any(|k| name.contains(k))
    {
        Family::Serif
    } else {
        return None;
    };

    let bold = ["bold", "black", "heavy", "semibold", "demi"]
        .iter()
        .any(|k| name.contains(k))
        || name.ends_with("-bd")
        || name == "hebo"
        || name == "tibo"
        || name == "cobo";
    let italic = ["italic", "oblique"].iter().any(|k| name.contains(k))
        || name.ends_with("-it");

    Some(StandardFont::from_parts(family, bold, italic))
}

/// Resolve a hint, falling back to `fallback` and finally to Helvetica.
pub fn resolve_font(hint: &str, fallback: &str) -> StandardFont {
    match_standard_font(hint)
        .or_else(|| match_standard_font(fallback))
        .unwrap_or(StandardFont::Helvetica)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subset_prefix_is_removed() {
        assert_eq!(normalize_font_name("ABCDEF+Arial-BoldMT"), "Arial-BoldMT");
        assert_eq!(normalize_font_name(" Helvetica "), "Helvetica");
        // Not a subset tag: keep as-is.
        assert_eq!(normalize_font_name("C++Mono"), "C++Mono");
    }

    #[test]
    fn families_and_styles_are_recognised() {
        assert_eq!(match_standard_font("helv"), Some(StandardFont::Helvetica));
        assert_eq!(
            match_standard_font("ABCDEF+Arial-BoldMT"),
            Some(StandardFont::HelveticaBold)
        );
        assert_eq!(
            match_standard_font("TimesNewRomanPS-ItalicMT"),
            Some(StandardFont::TimesItalic)
        );
        assert_eq!(
            match_standard_font("CourierNew-BoldItalic"),
            Some(StandardFont::CourierBoldOblique)
        );
        assert_eq!(match_standard_font("DejaVuSansMono"), Some(StandardFont::Courier));
    }

    #[test]
    fn unknown_hint_uses_fallback() {
        assert_eq!(resolve_font("Wingdings-Regular", "Times-Roman"), StandardFont::TimesRoman);
    }

    #[test]
    fn unresolvable_fallback_is_helvetica() {
        assert_eq!(resolve_font("", "NoSuchFont"), StandardFont::Helvetica);
        assert_eq!(resolve_font("Zzz", ""), StandardFont::Helvetica);
    }
}
