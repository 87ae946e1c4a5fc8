pub mod state;
pub mod view;

pub use state::{Focus, SelectionState};
pub use view::{IdentityGroup, MapPoint, OverviewModel, SeriesModel, View, ViewRequest};
