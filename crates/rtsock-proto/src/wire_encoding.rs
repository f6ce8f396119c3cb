//! Traits for routing-socket values with a fixed binary layout.

use bytes::{BufMut, Bytes, BytesMut};

/// A trait for types decodable from a wire format, without any additional information.
pub trait WireDecode<T>: Sized {
    /// The error type returned on a failed decode.
    type Error;

    /// Decodes an object from the provided data, such as a [`bytes::Buf`].
    ///
    /// The buffer is advanced by as many bytes as necessary to decode the object.
    /// Bytes are consumed regardless of whether or not decoding fails.
    fn decode(data: &mut T) -> Result<Self, Self::Error>;
}

/// A trait for types decodable from a wire format, *with* additional information.
///
/// Address entries, for example, can only be interpreted once the slot they occupy in
/// the message is known, which is provided as [`Self::Context`].
pub trait WireDecodeWithContext<T>: Sized {
    /// The error type returned on a failed decode.
    type Error;
    /// Data that should be provided to calls to decode.
    type Context;

    /// Decodes an object from the provided data with additional context.
    ///
    /// The buffer is advanced by as many bytes as necessary to decode the object.
    /// Bytes are consumed regardless of whether or not decoding fails.
    fn decode_with_context(data: &mut T, context: Self::Context) -> Result<Self, Self::Error>;
}

/// A trait for types encodable to a wire format of a length known before encoding.
pub trait WireEncode {
    /// The error type returned on a failed encode.
    type Error: std::fmt::Debug;

    /// The exact number of bytes written by [`Self::encode_to`].
    fn encoded_length(&self) -> usize;

    /// Encodes the object to the provided buffer.
    ///
    /// Nothing is written if the buffer cannot hold [`Self::encoded_length`] bytes.
    fn encode_to<T: BufMut>(&self, buffer: &mut T) -> Result<(), Self::Error>;

    /// Encodes the object to a newly allocated [`Bytes`].
    fn encode_to_bytes(&self) -> Bytes {
        let mut buffer = BytesMut::with_capacity(self.encoded_length());
        self.encode_to(&mut buffer).unwrap(); // BytesMut will grow as needed
        buffer.freeze()
    }
}
