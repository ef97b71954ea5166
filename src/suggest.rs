use crate::cities::City;

pub const NO_RESULTS: &str = "No cities found.";
pub const FETCH_FAILED: &str = "Failed to fetch cities. Check your API key.";

#[derive(Debug, Clone, PartialEq, Default)]
enum Content {
    #[default]
    Hidden,
    Cities(Vec<City>),
    Message(&'static str),
}

/// The autocomplete dropdown under the search box.
#[derive(Debug, Default)]
pub struct Suggestions {
    content: Content,
    selected: Option<usize>,
}

impl Suggestions {
    pub fn show(&mut self, cities: Vec<City>) {
        self.selected = None;
        self.content = if cities.is_empty() {
            Content::Message(NO_RESULTS)
        } else {
            Content::Cities(cities)
        };
    }

    pub fn fail(&mut self) {
        self.selected = None;
        self.content = Content::Message(FETCH_FAILED);
    }

    pub fn clear(&mut self) {
        self.selected = None;
        self.content = Content::Hidden;
    }

    pub fn is_visible(&self) -> bool {
        self.content != Content::Hidden
    }

    pub fn cities(&self) -> &[City] {
        match &self.content {
            Content::Cities(cities) => cities,
            _ => &[],
        }
    }

    pub fn message(&self) -> Option<&'static str> {
        match self.content {
            Content::Message(msg) => Some(msg),
            _ => None,
        }
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected(&self) -> Option<&City> {
        self.selected.and_then(|i| self.cities().get(i))
    }

    /// Arrow down: step to the next row, or onto the first row if nothing is
    /// selected yet. The last row is sticky.
    pub fn select_next(&mut self) {
        let len = self.cities().len();
        self.selected = match self.selected {
            Some(i) if i + 1 < len => Some(i + 1),
            Some(i) => Some(i),
            None if len > 0 => Some(0),
            None => None,
        };
    }

    /// Arrow up: step to the previous row. Does not select anything on its own
    /// and never wraps.
    pub fn select_prev(&mut self) {
        if let Some(i) = self.selected {
            self.selected = Some(i.saturating_sub(1));
        }
    }
}
