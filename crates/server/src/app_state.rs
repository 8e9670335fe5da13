use intake::IntakeContext;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) intake: IntakeContext,
}
