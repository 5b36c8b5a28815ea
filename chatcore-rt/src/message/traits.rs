use std::fmt::Debug;

/// A value that can travel through an actor's mailbox.
///
/// Each actor kind (User/Server/Channel, defined in `chatcore-actors`) has
/// its own closed `Message` enum; the runtime itself never inspects payload
/// contents, only routes envelopes.
pub trait Message: Debug + Clone + Send + Sync + 'static {
    /// A short, stable name for this message's type, used in log fields.
    const MESSAGE_TYPE: &'static str;
}
