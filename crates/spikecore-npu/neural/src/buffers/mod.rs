// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Delivery-time indexed input buffers owned by each node

pub mod multichannel;
pub mod ring_buffer;

pub use multichannel::MultiChannelBuffer;
pub use ring_buffer::RingBuffer;
