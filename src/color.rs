/// Cell color reference, resolved to concrete pixels by the renderer.
///
/// `Unset` defers to the renderer's configured default foreground or
/// background; `Named` is one of the 16 base ANSI colors, `Indexed` an
/// entry of the 256-color palette, `Rgb` a direct truecolor value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Color {
    #[default]
    Unset,
    Named(u8),
    Indexed(u8),
    Rgb(u8, u8, u8),
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Color::Unset => write!(f, "default"),
            Color::Named(n) => write!(f, "ansi({n})"),
            Color::Indexed(n) => write!(f, "indexed({n})"),
            Color::Rgb(r, g, b) => write!(f, "rgb({r}, {g}, {b})"),
        }
    }
}
