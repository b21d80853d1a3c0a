//! The game over menu.

use bevy::prelude::*;

use crate::{
    game::{highscore::HighScores, messages::GameOver, session::GameSession},
    menus::Menu,
    screens::Screen,
    theme::widget,
};

pub(super) fn plugin(app: &mut App) {
    app.add_systems(
        Update,
        open_on_game_over.run_if(in_state(Screen::Gameplay)),
    );
    app.add_systems(OnEnter(Menu::GameOver), spawn_gameover_menu);
}

/// Pause and open the menu once the simulation reports the run is over.
fn open_on_game_over(
    mut game_over: MessageReader<GameOver>,
    mut next_menu: ResMut<NextState<Menu>>,
    mut next_pause: ResMut<NextState<crate::Pause>>,
) {
    if game_over.read().next().is_some() {
        next_menu.set(Menu::GameOver);
        next_pause.set(crate::Pause(true));
    }
}

fn spawn_gameover_menu(
    mut commands: Commands,
    session: Res<GameSession>,
    high_scores: Res<HighScores>,
) {
    let best = high_scores.best().unwrap_or(session.score);

    commands.spawn((
        widget::ui_root("Game Over Menu"),
        GlobalZIndex(2),
        DespawnOnExit(Menu::GameOver),
        children![
            widget::header("Game Over"),
            widget::label(format!("Score: {}", session.score)),
            widget::label(format!("Level reached: {}", session.level)),
            widget::label(format!("Best: {best}")),
            widget::button("Play again", restart),
            widget::button("Quit to title", quit_to_title),
        ],
    ));
}

fn restart(
    _: On<Pointer<Click>>,
    mut commands: Commands,
    mut next_menu: ResMut<NextState<Menu>>,
    mut load: MessageWriter<crate::game::messages::LoadLevel>,
) {
    commands.insert_resource(GameSession::default());
    load.write(crate::game::messages::LoadLevel { level: 1 });
    next_menu.set(Menu::None);
}

fn quit_to_title(_: On<Pointer<Click>>, mut next_screen: ResMut<NextState<Screen>>) {
    next_screen.set(Screen::Title);
}
