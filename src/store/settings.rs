use super::{AppStore, StoreError, SETTINGS_KEY};
use crate::model::{Settings, SettingsPatch};

impl AppStore {
    /// Merge the persisted blob over the defaults. Fields the blob lacks keep
    /// their default values.
    pub(super) fn load_settings(&mut self) {
        if let Some(patch) = self.load_blob::<SettingsPatch>(SETTINGS_KEY) {
            self.settings.merge(patch);
        }
    }

    pub fn settings(&self) -> Settings {
        self.settings.clone()
    }

    pub fn update_settings(&mut self, patch: SettingsPatch) -> Result<Settings, StoreError> {
        let mut settings = self.settings.clone();
        settings.merge(patch);
        self.persist(SETTINGS_KEY, &settings)?;
        self.settings = settings.clone();
        Ok(settings)
    }
}
