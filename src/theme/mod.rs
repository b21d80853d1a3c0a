//! Reusable UI widgets & theming.

// Unused utilities may trigger this lints undesirably.
#![allow(dead_code)]

pub mod interaction;
pub mod palette;
pub mod widget;

#[allow(unused_imports)]
pub mod prelude {
    pub use super::{interaction::InteractionPalette, palette as ui_palette, widget};
}

use bevy::prelude::*;

use crate::asset_tracking::LoadResource;

/// Resource holding the game's custom font.
#[derive(Resource, Asset, Clone, Reflect)]
#[reflect(Resource)]
pub struct GameFont(#[dependency] pub Handle<Font>);

impl FromWorld for GameFont {
    fn from_world(world: &mut World) -> Self {
        let asset_server = world.resource::<AssetServer>();
        Self(asset_server.load("fonts/DejaVuSans.ttf"))
    }
}

pub(super) fn plugin(app: &mut App) {
    app.add_plugins(interaction::plugin);
    app.register_type::<GameFont>();
    app.load_resource::<GameFont>();
}
