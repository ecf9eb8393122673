/// Positioning and sizing properties a takeover overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleProperty {
    Position,
    Top,
    Left,
    Bottom,
    Right,
    ZIndex,
    Width,
    Height,
}

impl StyleProperty {
    /// Every tracked property.
    pub const TRACKED: [StyleProperty; 8] = [
        StyleProperty::Position,
        StyleProperty::Top,
        StyleProperty::Left,
        StyleProperty::Bottom,
        StyleProperty::Right,
        StyleProperty::ZIndex,
        StyleProperty::Width,
        StyleProperty::Height,
    ];

    /// CSS property name.
    pub fn css_name(self) -> &'static str {
        match self {
            StyleProperty::Position => "position",
            StyleProperty::Top => "top",
            StyleProperty::Left => "left",
            StyleProperty::Bottom => "bottom",
            StyleProperty::Right => "right",
            StyleProperty::ZIndex => "z-index",
            StyleProperty::Width => "width",
            StyleProperty::Height => "height",
        }
    }

    /// Value applied while a takeover is active.
    pub fn takeover_value(self) -> &'static str {
        match self {
            StyleProperty::Position => "fixed",
            StyleProperty::Top
            | StyleProperty::Left
            | StyleProperty::Bottom
            | StyleProperty::Right => "0",
            StyleProperty::ZIndex => "999999",
            StyleProperty::Width => "100vw",
            StyleProperty::Height => "100vh",
        }
    }
}

/// Inline style access on the element a bridge takes over.
pub trait StyleTarget {
    /// Current inline value, empty when unset.
    fn style(&self, property: StyleProperty) -> String;

    /// Set an inline value; the empty string clears it.
    fn set_style(&mut self, property: StyleProperty, value: &str);
}

/// Inline values of the tracked properties, captured before a takeover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleSnapshot {
    values: Vec<(StyleProperty, String)>,
}

impl StyleSnapshot {
    /// Record the current value of every tracked property.
    pub fn capture(target: &dyn StyleTarget) -> Self {
        Self {
            values: StyleProperty::TRACKED
                .into_iter()
                .map(|property| (property, target.style(property)))
                .collect(),
        }
    }

    /// Write every recorded value back verbatim.
    pub fn restore(&self, target: &mut dyn StyleTarget) {
        for (property, value) in &self.values {
            target.set_style(*property, value);
        }
    }

    /// Recorded value of `property`.
    pub fn get(&self, property: StyleProperty) -> Option<&str> {
        self.values
            .iter()
            .find(|(tracked, _)| *tracked == property)
            .map(|(_, value)| value.as_str())
    }
}

/// Override every tracked property so the element fills the viewport.
pub fn apply_takeover(target: &mut dyn StyleTarget) {
    for property in StyleProperty::TRACKED {
        target.set_style(property, property.takeover_value());
    }
}
