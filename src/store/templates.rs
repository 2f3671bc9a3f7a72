use crate::models::{Language, MessageRole, MessageType};

use super::{Slot, Store, StoreError, StoreResult};

impl Store {
    pub fn custom_template(&self, language: Language, message: MessageType, role: MessageRole) -> Option<&str> {
        self.custom_templates
            .get(&language)
            .and_then(|by_type| by_type.get(&message))
            .and_then(|by_role| by_role.get(&role))
            .map(String::as_str)
    }

    pub fn save_custom_template(
        &mut self,
        language: Language,
        message: MessageType,
        role: MessageRole,
        text: &str,
    ) -> StoreResult<()> {
        self.custom_templates
            .entry(language)
            .or_default()
            .entry(message)
            .or_default()
            .insert(role, text.to_string());
        self.persist(&[Slot::CustomTemplates])
    }

    /// Drop a custom template, pruning the language and type entries it leaves empty.
    pub fn delete_custom_template(
        &mut self,
        language: Language,
        message: MessageType,
        role: MessageRole,
    ) -> StoreResult<()> {
        let missing = || StoreError::not_found("custom template", format!("{}/{}/{}", language, message, role));

        let by_type = self.custom_templates.get_mut(&language).ok_or_else(missing)?;
        let by_role = by_type.get_mut(&message).ok_or_else(missing)?;
        by_role.remove(&role).ok_or_else(missing)?;

        if by_role.is_empty() {
            by_type.remove(&message);
        }
        if by_type.is_empty() {
            self.custom_templates.remove(&language);
        }
        self.persist(&[Slot::CustomTemplates])
    }

    pub fn save_custom_host_request_template(&mut self, language: Language, text: &str) -> StoreResult<()> {
        self.host_request_templates.insert(language, text.to_string());
        self.persist(&[Slot::HostRequestTemplates])
    }

    pub fn delete_custom_host_request_template(&mut self, language: Language) -> StoreResult<()> {
        self.host_request_templates
            .remove(&language)
            .ok_or_else(|| StoreError::not_found("host request template", language.to_string()))?;
        self.persist(&[Slot::HostRequestTemplates])
    }
}

#[cfg(test)]
mod tests {
    use crate::db::test_fixtures::empty_store;
    use crate::models::{Language, MessageRole, MessageType};
    use crate::store::{CUSTOM_TEMPLATES_KEY, StoreError};

    #[test]
    fn save_then_read_back() {
        let mut store = empty_store();
        store
            .save_custom_template(Language::Fr, MessageType::Thanks, MessageRole::Host, "Merci !")
            .unwrap();
        assert_eq!(
            store.custom_template(Language::Fr, MessageType::Thanks, MessageRole::Host),
            Some("Merci !")
        );
        assert_eq!(store.custom_template(Language::Fr, MessageType::Thanks, MessageRole::Speaker), None);
    }

    #[test]
    fn delete_prunes_empty_parents() {
        let mut store = empty_store();
        store
            .save_custom_template(Language::Cv, MessageType::Needs, MessageRole::Speaker, "a")
            .unwrap();
        store
            .save_custom_template(Language::Cv, MessageType::Needs, MessageRole::Host, "b")
            .unwrap();

        store
            .delete_custom_template(Language::Cv, MessageType::Needs, MessageRole::Speaker)
            .unwrap();
        assert!(store.custom_templates()[&Language::Cv].contains_key(&MessageType::Needs));

        store
            .delete_custom_template(Language::Cv, MessageType::Needs, MessageRole::Host)
            .unwrap();
        assert!(store.custom_templates().is_empty());
        assert_eq!(store.kv.get_raw(CUSTOM_TEMPLATES_KEY).unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn delete_missing_template_is_not_found() {
        let mut store = empty_store();
        assert!(matches!(
            store.delete_custom_template(Language::Fr, MessageType::Preparation, MessageRole::Host),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn host_request_templates_are_per_language() {
        let mut store = empty_store();
        store.save_custom_host_request_template(Language::Fr, "Qui peut loger ?").unwrap();
        store.save_custom_host_request_template(Language::Cv, "Kenha...").unwrap();
        store.delete_custom_host_request_template(Language::Cv).unwrap();

        assert_eq!(store.host_request_templates().len(), 1);
        assert!(store.delete_custom_host_request_template(Language::Cv).is_err());
    }
}
