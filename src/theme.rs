use gpui::*;

/// Context menu palette. The clock face itself is painted in tier colors.
#[derive(Clone, Copy)]
pub struct MenuTheme {
    pub background: Hsla,
    pub foreground: Hsla,
    pub border: Hsla,
    pub hover: Hsla,
    pub muted: Hsla,
    pub error: Hsla,
}

impl MenuTheme {
    pub fn for_appearance(appearance: WindowAppearance) -> Self {
        match appearance {
            WindowAppearance::Dark | WindowAppearance::VibrantDark => Self::night(),
            WindowAppearance::Light | WindowAppearance::VibrantLight => Self::day(),
        }
    }

    // Cream paper with the clock's navy as ink.
    fn day() -> Self {
        Self {
            background: rgb(0xf7f4ec).into(),
            foreground: rgb(0x0a1932).into(),
            border: rgb(0xd9d2bf).into(),
            hover: rgb(0xece6d6).into(),
            muted: rgb(0x6a7487).into(),
            error: rgb(0xc1121f).into(),
        }
    }

    fn night() -> Self {
        Self {
            background: rgb(0x0f213f).into(),
            foreground: rgb(0xe8eef7).into(),
            border: rgb(0x1e3a66).into(),
            hover: rgb(0x1a3159).into(),
            muted: rgb(0x8ea3c2).into(),
            error: rgb(0xff6b6b).into(),
        }
    }
}
