/// The minimal set of rows needed to bring a channel actor's state back to
/// life when its parent server actor starts (or replicates into a new
/// region) and re-reads its children from the store of record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSeed {
    pub id: String,
    pub category_id: Option<String>,
    pub users: Vec<String>,
    pub roles: Vec<String>,
}
