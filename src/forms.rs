//! Form snapshots and the request payloads built from them.
//!
//! Text fields pass through verbatim. Only the menu form validates anything,
//! and it does so before a single byte goes over the network.

use serde::{Deserialize, Serialize};

use crate::client::Endpoint;
use crate::encoder::{deserialize_optional_logo, encode_file, encode_logo, LogoFile};
use crate::error::{ValidationError, WorkflowError};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub price: String,
}

impl MenuItem {
    pub fn new(name: impl Into<String>, price: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            price: price.into(),
        }
    }

    fn is_complete(&self) -> bool {
        !self.name.is_empty() && !self.price.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromotionalRequest {
    pub business_type: String,
    pub business_name: String,
    pub location: String,
    pub headline: String,
    pub style: String,
    pub color_palette: String,
    pub logo_base64: Option<String>,
    pub use_logo_colors: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FestivalRequest {
    pub business_name: String,
    pub location: String,
    pub festival: String,
    pub greeting: String,
    pub style: String,
    pub color_palette: String,
    pub logo_base64: Option<String>,
    pub use_logo_colors: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuRequest {
    pub business_name: String,
    pub contact_info: String,
    pub logo_base64: String,
    pub menu_items: Vec<MenuItem>,
}

/// Payload sent to a generation endpoint. Serializes as the bare inner body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum GenerationRequest {
    Promotional(PromotionalRequest),
    Festival(FestivalRequest),
    Menu(MenuRequest),
}

impl GenerationRequest {
    pub fn endpoint(&self) -> Endpoint {
        match self {
            GenerationRequest::Promotional(_) => Endpoint::Poster,
            GenerationRequest::Festival(_) => Endpoint::FestivalPoster,
            GenerationRequest::Menu(_) => Endpoint::Menu,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PromotionalForm {
    pub business_type: String,
    pub business_name: String,
    pub location: String,
    pub headline: String,
    pub style: String,
    pub color_palette: String,
    #[serde(default, deserialize_with = "deserialize_optional_logo")]
    pub logo: Option<LogoFile>,
    #[serde(default)]
    pub use_logo_colors: bool,
}

impl PromotionalForm {
    pub async fn collect(&self) -> Result<GenerationRequest, WorkflowError> {
        let logo_base64 = encode_logo(self.logo.as_ref()).await?;
        Ok(GenerationRequest::Promotional(PromotionalRequest {
            business_type: self.business_type.clone(),
            business_name: self.business_name.clone(),
            location: self.location.clone(),
            headline: self.headline.clone(),
            style: self.style.clone(),
            color_palette: self.color_palette.clone(),
            logo_base64,
            use_logo_colors: self.use_logo_colors,
        }))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FestivalForm {
    pub business_name: String,
    pub location: String,
    pub festival: String,
    pub greeting: String,
    pub style: String,
    pub color_palette: String,
    #[serde(default, deserialize_with = "deserialize_optional_logo")]
    pub logo: Option<LogoFile>,
    #[serde(default)]
    pub use_logo_colors: bool,
}

impl FestivalForm {
    pub async fn collect(&self) -> Result<GenerationRequest, WorkflowError> {
        let logo_base64 = encode_logo(self.logo.as_ref()).await?;
        Ok(GenerationRequest::Festival(FestivalRequest {
            business_name: self.business_name.clone(),
            location: self.location.clone(),
            festival: self.festival.clone(),
            greeting: self.greeting.clone(),
            style: self.style.clone(),
            color_palette: self.color_palette.clone(),
            logo_base64,
            use_logo_colors: self.use_logo_colors,
        }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowId(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuRow {
    id: RowId,
    pub item: MenuItem,
}

impl MenuRow {
    pub fn id(&self) -> RowId {
        self.id
    }
}

/// The user-editable list of (name, price) rows on the menu form.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "Vec<MenuItem>")]
pub struct MenuRows {
    rows: Vec<MenuRow>,
    next_id: u64,
}

impl MenuRows {
    /// A fresh form shows a single empty row.
    pub fn new() -> Self {
        let mut rows = Self::empty();
        rows.add();
        rows
    }

    pub fn empty() -> Self {
        Self {
            rows: Vec::new(),
            next_id: 0,
        }
    }

    pub fn add(&mut self) -> RowId {
        self.push(MenuItem::default())
    }

    pub fn push(&mut self, item: MenuItem) -> RowId {
        let id = RowId(self.next_id);
        self.next_id += 1;
        self.rows.push(MenuRow { id, item });
        id
    }

    /// Detaches exactly the row with `id`. Returns false if it was already gone.
    pub fn remove(&mut self, id: RowId) -> bool {
        match self.rows.iter().position(|row| row.id == id) {
            Some(index) => {
                self.rows.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn row_mut(&mut self, id: RowId) -> Option<&mut MenuItem> {
        self.rows
            .iter_mut()
            .find(|row| row.id == id)
            .map(|row| &mut row.item)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MenuRow> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows with both a name and a price, in display order.
    pub fn valid_items(&self) -> Vec<MenuItem> {
        self.rows
            .iter()
            .filter(|row| row.item.is_complete())
            .map(|row| row.item.clone())
            .collect()
    }
}

impl Default for MenuRows {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Vec<MenuItem>> for MenuRows {
    fn from(items: Vec<MenuItem>) -> Self {
        let mut rows = Self::empty();
        for item in items {
            rows.push(item);
        }
        rows
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MenuForm {
    pub business_name: String,
    pub contact_info: String,
    #[serde(default, deserialize_with = "deserialize_optional_logo")]
    pub logo: Option<LogoFile>,
    #[serde(default)]
    pub items: MenuRows,
}

impl MenuForm {
    pub async fn collect(&self) -> Result<GenerationRequest, WorkflowError> {
        let logo = self.logo.as_ref().ok_or(ValidationError::MissingLogo)?;
        let logo_base64 = encode_file(logo).await?;

        let menu_items = self.items.valid_items();
        if menu_items.is_empty() {
            return Err(ValidationError::NoMenuItems.into());
        }

        Ok(GenerationRequest::Menu(MenuRequest {
            business_name: self.business_name.clone(),
            contact_info: self.contact_info.clone(),
            logo_base64,
            menu_items,
        }))
    }
}
