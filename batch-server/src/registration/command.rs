//! Operator commands
//!
//! Each UI action is one [`RegistrationCommand`]; [`apply_command`] validates
//! it against the state before mutating, so a rejected command leaves the
//! state untouched.

use serde::{Deserialize, Serialize};

use super::error::RegistrationResult;
use super::state::RegistrationState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RegistrationCommand {
    SetTitle {
        position: usize,
        title_id: Option<i64>,
    },
    SetColor {
        position: usize,
        color: Option<String>,
    },
    SetPrimary {
        position: usize,
        image: usize,
        on: bool,
    },
    SetGallery {
        position: usize,
        image: usize,
        on: bool,
    },
    Duplicate {
        position: usize,
    },
    Delete {
        position: usize,
    },
    GoToPage {
        page: usize,
    },
}

impl RegistrationCommand {
    /// Whether the command inserts or removes a product
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::Duplicate { .. } | Self::Delete { .. })
    }
}

/// Apply one command; returns the position it affected, if any
pub fn apply_command(
    state: &mut RegistrationState,
    command: RegistrationCommand,
) -> RegistrationResult<Option<usize>> {
    match command {
        RegistrationCommand::SetTitle { position, title_id } => {
            state.set_title(position, title_id)?;
            Ok(Some(position))
        }
        RegistrationCommand::SetColor { position, color } => {
            state.set_color(position, color)?;
            Ok(Some(position))
        }
        RegistrationCommand::SetPrimary {
            position,
            image,
            on,
        } => {
            state.set_primary(position, image, on)?;
            Ok(Some(position))
        }
        RegistrationCommand::SetGallery {
            position,
            image,
            on,
        } => {
            state.set_gallery(position, image, on)?;
            Ok(Some(position))
        }
        RegistrationCommand::Duplicate { position } => state.duplicate(position).map(Some),
        RegistrationCommand::Delete { position } => {
            let removed = state.delete(position)?;
            tracing::info!(position, name = %removed.product.name, "Product removed from batch");
            Ok(None)
        }
        RegistrationCommand::GoToPage { page } => {
            state.go_to_page(page)?;
            Ok(None)
        }
    }
}
