//! Single dispatch point over the scene state sum type.

use super::cancel::CancelScene;
use super::confirm::ConfirmScene;
use super::create::CreateScene;
use super::move_appointment::MoveScene;
use super::scene::{SceneReply, SceneServices, SceneState};
use super::session::SceneName;
use super::show::ShowScene;

pub struct SceneRouter;

impl SceneRouter {
    /// Initial state for a user-initiated scene. Confirm is excluded: it is
    /// seeded externally with an appointment id.
    pub fn initial_state(name: SceneName) -> Option<SceneState> {
        match name {
            SceneName::CreateAppointment => {
                Some(SceneState::CreateAppointment(CreateScene::initial_state()))
            }
            SceneName::MoveAppointment => {
                Some(SceneState::MoveAppointment(MoveScene::initial_state()))
            }
            SceneName::CancelAppointment => {
                Some(SceneState::CancelAppointment(CancelScene::initial_state()))
            }
            SceneName::ShowAppointment => {
                Some(SceneState::ShowAppointment(ShowScene::initial_state()))
            }
            SceneName::ConfirmAppointment => None,
        }
    }

    pub async fn dispatch(
        services: &SceneServices,
        state: SceneState,
        message: &str,
    ) -> SceneReply {
        match state {
            SceneState::CreateAppointment(state) => {
                CreateScene::new(services).handle_message(state, message).await
            }
            SceneState::MoveAppointment(state) => {
                MoveScene::new(services).handle_message(state, message).await
            }
            SceneState::CancelAppointment(state) => {
                CancelScene::new(services).handle_message(state, message).await
            }
            SceneState::ShowAppointment(state) => {
                ShowScene::new(services).handle_message(state, message).await
            }
            SceneState::ConfirmAppointment(state) => {
                ConfirmScene::new(services).handle_message(state, message).await
            }
        }
    }
}
