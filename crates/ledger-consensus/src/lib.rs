pub mod majority;
pub mod redownload;

pub use majority::{choose_majority_state, tally_occurrences};
pub use redownload::{
    choose_majority_snapshot_list, compare_snapshot_state, compare_snapshot_state_with_majority,
    should_re_download,
};
