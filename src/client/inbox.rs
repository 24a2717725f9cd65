use core::cell::RefCell;

use heapless::Deque;

use crate::network::PublishPacket;

/// FIFO between a transport data callback and
/// [`DeviceClient::drain`](super::DeviceClient::drain).
///
/// The data callback only borrows the queue, so it can be registered on the
/// transport while the device client owns that transport. Both sides must
/// run in the same execution context; the queue is not `Sync`.
#[derive(Debug)]
pub struct InboundQueue<const N: usize> {
    packets: RefCell<Deque<PublishPacket, N>>,
}

impl<const N: usize> InboundQueue<N> {
    /// An empty queue.
    pub const fn new() -> Self {
        Self {
            packets: RefCell::new(Deque::new()),
        }
    }

    /// Copies `packet` into the queue. Returns `false` and drops the packet
    /// if the queue is full.
    pub fn push(&self, packet: &PublishPacket) -> bool {
        let Ok(mut packets) = self.packets.try_borrow_mut() else {
            error!("inbound queue busy, dropping message on {}", packet.topic.as_str());
            return false;
        };
        if packets.push_back(packet.clone()).is_err() {
            warn!("inbound queue full, dropping message on {}", packet.topic.as_str());
            return false;
        }
        true
    }

    /// Takes the oldest packet.
    pub fn pop(&self) -> Option<PublishPacket> {
        self.packets.try_borrow_mut().ok()?.pop_front()
    }

    /// Number of queued packets.
    pub fn len(&self) -> usize {
        self.packets.borrow().len()
    }

    /// Whether nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.packets.borrow().is_empty()
    }
}

impl<const N: usize> Default for InboundQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_order_and_overflow() {
        let queue = InboundQueue::<2>::new();
        let first = PublishPacket::new("a", b"1").unwrap();
        let second = PublishPacket::new("b", b"2").unwrap();
        let third = PublishPacket::new("c", b"3").unwrap();

        assert!(queue.push(&first));
        assert!(queue.push(&second));
        assert!(!queue.push(&third));
        assert_eq!(queue.len(), 2);

        assert_eq!(queue.pop(), Some(first));
        assert_eq!(queue.pop(), Some(second));
        assert_eq!(queue.pop(), None);
        assert!(queue.is_empty());
    }
}
