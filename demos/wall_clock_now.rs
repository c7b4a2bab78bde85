//! Drives a fake `wasi:clocks/wall-clock.now` export end to end through this
//! crate's public API: lower zero arguments, invoke the guest, lift a
//! `{ seconds: u64, nanoseconds: u32 }` record back out of its return
//! pointer, then run the guest's post-return hook. No real Wasm engine is
//! involved; [`FakeGuest`] stands in for one, the way a generated host
//! wrapper's tests would stub it out.

use wasm_canonical_abi::prelude::*;
use wasm_canonical_abi::{alloc::Realloc, host::HostCall, memory::VecMemory};

/// A bump allocator standing in for a guest's `cabi_realloc` export. Never
/// actually frees memory, fine for a single demo call, not for production
/// use.
struct BumpRealloc {
    next: u32,
}

impl Realloc for BumpRealloc {
    fn realloc(&mut self, _old_ptr: u32, _old_size: u32, align: u32, new_size: u32) -> u32 {
        if new_size == 0 {
            return 0;
        }
        let aligned = (self.next + align - 1) & !(align - 1);
        self.next = aligned + new_size;
        aligned
    }
}

/// A guest that answers `wall-clock.now` by writing a fixed timestamp
/// through the return pointer it's handed, then tracks whether its
/// post-return hook ran.
struct FakeGuest {
    post_return_ran: bool,
    last_retptr: Option<u32>,
}

impl HostCall for FakeGuest {
    fn call(&mut self, name: &str, args: &[u64]) -> Result<Vec<u64>> {
        assert_eq!(name, "wall-clock.now");
        // A real guest would have already written the record's bytes through
        // this pointer before returning; the demo pre-seeds them into `mem`
        // below instead, since `FakeGuest` has no real Wasm memory to write.
        self.last_retptr = Some(args[0] as u32);
        Ok(vec![])
    }

    fn call_post_return(&mut self, name: &str, _args: &[u64]) -> Result<()> {
        assert_eq!(name, "wall-clock.now");
        self.post_return_ran = true;
        Ok(())
    }
}

fn main() {
    let result_ty = ValType::record([("seconds", ValType::U64), ("nanoseconds", ValType::U32)]);

    let mut mem = VecMemory::new(64);
    let mut realloc = BumpRealloc { next: 0 };
    let mut guest = FakeGuest { post_return_ran: false, last_retptr: None };

    // The guest doesn't actually have a Wasm function to write the record
    // for us, so pre-seed the buffer at the address `call` will allocate:
    // a bump allocator starting at `next: 0` always hands back address `0`
    // for the first allocation of a call.
    wasm_canonical_abi::memory::store_u64(&mut mem, 0, 1_700_000_000).unwrap();
    wasm_canonical_abi::memory::store_u32(&mut mem, 8, 123_456_789).unwrap();

    let mut opts = AbiOptions::new(&mut mem, &mut guest, &mut realloc, StringEncoding::Utf8);
    let results = wasm_canonical_abi::call(&mut opts, "wall-clock.now", &[], &[], &[result_ty]).unwrap();

    match &results[0] {
        Value::Record(fields) => {
            let seconds = &fields[0].1;
            let nanoseconds = &fields[1].1;
            println!("wall-clock.now -> seconds={seconds:?} nanoseconds={nanoseconds:?}");
        }
        other => panic!("expected a record, got {other:?}"),
    }

    assert_eq!(guest.last_retptr, Some(0), "first allocation of the call should land at address 0");
    assert!(guest.post_return_ran, "cabi_post_wall-clock.now must run after the result is lifted");
}
