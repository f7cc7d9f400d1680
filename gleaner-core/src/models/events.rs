/// One entry of an upcoming events listing.
///
/// Fields are named after the markup they are read from: `location` is the
/// `event-location` span and `time` is the `<time>` element. Older output of
/// this listing used the keys `name` and `location` for these same two values.
#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct Event {
    pub location: String,
    pub time: String,
}
