pub mod category;
pub mod signal;

pub mod cfg;
pub mod codec;
pub mod state;
pub mod decide;

pub use category::{CategoryChoices, ConsentAction, ConsentCategories, ConsentCategory};
pub use signal::{consent_params, ConsentParams, SignalState};

pub use cfg::{ConsentConfig, ConsentOptions};
pub use codec::{decode_record, encode_record, RecordDecodeError};
pub use state::{ConsentRecord, Presentation};
pub use decide::{decide_initial, InitDecision};
