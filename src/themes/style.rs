/// Per-widget style override, falling back to the style derived from the
/// surrounding `egui::Style` when unset.
pub trait Styled: Sized {
    type Style: Clone;

    fn set_style(&mut self, style: Option<Self::Style>);

    fn styled(mut self, style: Self::Style) -> Self {
        self.set_style(Some(style));
        self
    }
}
