/// External collaborators: translation oracles and the contribution store
///
/// The resolver never talks to a remote service directly. It goes through
/// two seams defined here:
///
/// 1. **Contribution store** - approved community entries for the overlay,
///    and write-back of gateway discoveries
/// 2. **Translation gateway** - the oracle of last resort for tokens the local
///    tiers cannot resolve, built on a `MachineTranslator` provider
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use lexitier::mt::{GoogleTranslateProvider, RestContributionStore, TranslatorGateway};
///
/// let store = Arc::new(RestContributionStore::from_env()?);
/// let provider = Arc::new(GoogleTranslateProvider::from_env()?);
/// let gateway = TranslatorGateway::new(provider, "vi", "tyz")?.with_store(store);
/// ```
pub mod gateway;
pub mod google_translate;
pub mod mock;
pub mod store;
pub mod translator;

pub use gateway::{TranslationGateway, TranslatorGateway};
pub use google_translate::GoogleTranslateProvider;
pub use mock::{MockMode, MockTranslator};
pub use store::{
    ContributionRecord, ContributionStore, InMemoryContributionStore, RestContributionStore,
};
pub use translator::{MachineTranslator, normalize_locale, validate_locale};
