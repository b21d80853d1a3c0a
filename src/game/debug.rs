//! Debug visualization for the packed grid.
//!
//! Toggle with the 'D' key during gameplay. Shows every slot outline with
//! occupied cells highlighted.

use bevy::{color::palettes::css, input::common_conditions::input_just_pressed, prelude::*};

use super::coords::{BUBBLE_SIZE, GRID_HEIGHT, GridCoord, LIMIT_LINE_Y};
use super::grid::BubbleGrid;
use super::session::Ceiling;
use crate::screens::Screen;

pub(super) fn plugin(app: &mut App) {
    app.init_resource::<DebugGridVisible>();

    app.add_systems(
        Update,
        toggle_debug.run_if(in_state(Screen::Gameplay).and(input_just_pressed(KeyCode::KeyD))),
    );
    app.add_systems(
        Update,
        draw_debug_grid.run_if(in_state(Screen::Gameplay).and(debug_visible)),
    );
}

/// Resource to track if debug visualization is visible.
#[derive(Resource, Default)]
pub struct DebugGridVisible(pub bool);

fn debug_visible(debug: Res<DebugGridVisible>) -> bool {
    debug.0
}

fn toggle_debug(mut debug: ResMut<DebugGridVisible>) {
    debug.0 = !debug.0;
    let state = if debug.0 { "ON" } else { "OFF" };
    info!("Debug grid: {}", state);
}

/// Draw every slot outline using Bevy's Gizmos.
fn draw_debug_grid(mut gizmos: Gizmos, grid: Res<BubbleGrid>, ceiling: Res<Ceiling>) {
    for row in 0..GRID_HEIGHT {
        for col in 0..GridCoord::columns_in_row(row) {
            let coord = GridCoord::new(row, col);
            let center = coord.world_center(ceiling.offset);

            let color = if grid.cell(coord).is_occupied() {
                css::LIMEGREEN.with_alpha(0.5)
            } else if row == 0 {
                // Row attached to the ceiling.
                css::GOLD.with_alpha(0.3)
            } else if center.y - BUBBLE_SIZE / 2.0 <= LIMIT_LINE_Y {
                // Slots already past the limit line.
                css::INDIAN_RED.with_alpha(0.3)
            } else {
                css::WHITE.with_alpha(0.15)
            };

            gizmos.circle_2d(center, BUBBLE_SIZE / 2.0, color);
        }
    }
}
