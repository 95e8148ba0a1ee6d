use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// The seam between a decoded command and the store. `exec` is async because
/// blocking commands (BLPOP) suspend until data arrives or their timeout
/// elapses; everything else completes without yielding.
#[allow(async_fn_in_trait)]
pub trait Executable {
    async fn exec(self, store: Store) -> Result<Frame, Error>;
}
