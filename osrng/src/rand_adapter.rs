//! `rand_core` bridge for [`OsRng`].
//!
//! Lets the validated reader drive anything generic over `RngCore +
//! CryptoRng` (key generation, nonce sampling) without a second entropy
//! path. `try_fill_bytes` propagates failures; the infallible methods panic.

use crate::channel::EntropyChannel;
use crate::rng::OsRng;
use rand_core::{CryptoRng, RngCore};

impl<C: EntropyChannel> RngCore for OsRng<C> {
    fn next_u32(&mut self) -> u32 {
        let mut buf = [0u8; 4];
        self.fill_bytes(&mut buf);
        u32::from_le_bytes(buf)
    }

    fn next_u64(&mut self) -> u64 {
        let mut buf = [0u8; 8];
        self.fill_bytes(&mut buf);
        u64::from_le_bytes(buf)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        // A caller on the infallible path has no way to handle missing
        // entropy, and continuing with a zeroed buffer would be worse.
        if let Err(err) = self.fill(dest) {
            panic!("OS entropy source failed, cannot proceed safely: {err}");
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        self.fill(dest).map_err(rand_core::Error::new)
    }
}

// Marker trait: output comes straight from the OS entropy device.
impl<C: EntropyChannel> CryptoRng for OsRng<C> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::scripted::{ScriptedChannel, Step};
    use rand::Rng;

    #[test]
    fn works_as_rand_rng() {
        let mut rng = OsRng::new().unwrap();
        let a: [u8; 32] = rng.gen();
        let b: [u8; 32] = rng.gen();
        assert_ne!(a, b);
        let roll = rng.gen_range(1..=6);
        assert!((1..=6).contains(&roll));
    }

    #[test]
    fn next_u32_is_little_endian_of_device_bytes() {
        let channel = ScriptedChannel::healthy([Step::Bytes(vec![0x01, 0x02, 0x03, 0x04])]);
        let mut rng = OsRng::from_channel(channel).unwrap();
        assert_eq!(rng.next_u32(), 0x0403_0201);
    }

    #[test]
    fn try_fill_bytes_propagates_closed() {
        let mut rng = OsRng::new().unwrap();
        rng.close();
        let mut buf = [0u8; 8];
        assert!(rng.try_fill_bytes(&mut buf).is_err());
    }

    #[test]
    #[should_panic(expected = "cannot proceed safely")]
    fn fill_bytes_panics_on_starved_device() {
        let channel = ScriptedChannel::healthy([Step::Eof]);
        let mut rng = OsRng::from_channel(channel).unwrap();
        let mut buf = [0u8; 8];
        rng.fill_bytes(&mut buf);
    }

    fn takes_crypto_rng<R: RngCore + CryptoRng>(rng: &mut R) -> u64 {
        rng.next_u64()
    }

    #[test]
    fn satisfies_crypto_rng_bound() {
        let mut rng = OsRng::new().unwrap();
        let _ = takes_crypto_rng(&mut rng);
    }
}
