//! The main menu (seen on the title screen).

use bevy::prelude::*;

use crate::{
    asset_tracking::ResourceHandles,
    game::shooter::{Character, SelectedCharacter},
    menus::Menu,
    screens::Screen,
    theme::widget,
};

pub(super) fn plugin(app: &mut App) {
    app.add_systems(OnEnter(Menu::Main), spawn_main_menu);
    app.add_systems(
        Update,
        update_character_button.run_if(in_state(Menu::Main)),
    );
}

/// Marker for the character-select button label.
#[derive(Component)]
struct CharacterButtonLabel;

fn spawn_main_menu(mut commands: Commands, character: Res<SelectedCharacter>) {
    commands.spawn((
        widget::ui_root("Main Menu"),
        GlobalZIndex(2),
        DespawnOnExit(Menu::Main),
        #[cfg(not(target_family = "wasm"))]
        children![
            widget::header("Bubble Bluster"),
            widget::button("Play", enter_loading_or_gameplay_screen),
            widget::button(character_label(character.0), cycle_character),
            widget::button("Exit", exit_app),
        ],
        #[cfg(target_family = "wasm")]
        children![
            widget::header("Bubble Bluster"),
            widget::button("Play", enter_loading_or_gameplay_screen),
            widget::button(character_label(character.0), cycle_character),
        ],
    ));
}

fn character_label(character: Character) -> String {
    format!("Character: {}", character.name())
}

fn enter_loading_or_gameplay_screen(
    _: On<Pointer<Click>>,
    resource_handles: Res<ResourceHandles>,
    mut next_screen: ResMut<NextState<Screen>>,
) {
    if resource_handles.is_all_done() {
        next_screen.set(Screen::Gameplay);
    } else {
        next_screen.set(Screen::Loading);
    }
}

fn cycle_character(_: On<Pointer<Click>>, mut character: ResMut<SelectedCharacter>) {
    character.0 = character.0.next();
    info!("Selected character: {}", character.0.name());
}

/// Keep the character button label in sync with the selection.
fn update_character_button(
    character: Res<SelectedCharacter>,
    mut label_query: Query<&mut Text>,
    button_query: Query<&Children, With<Button>>,
) {
    if !character.is_changed() {
        return;
    }
    for children in &button_query {
        for child in children.iter() {
            if let Ok(mut text) = label_query.get_mut(child)
                && text.0.starts_with("Character:")
            {
                text.0 = character_label(character.0);
            }
        }
    }
}

#[cfg(not(target_family = "wasm"))]
fn exit_app(_: On<Pointer<Click>>, mut app_exit: MessageWriter<AppExit>) {
    app_exit.write(AppExit::Success);
}
