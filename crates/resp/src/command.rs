//! Outgoing commands.

use bytes::Bytes;

/// Conversion of a scalar into its textual wire representation.
pub trait ToArg {
	fn to_arg(&self) -> Bytes;
}

impl ToArg for str {
	fn to_arg(&self) -> Bytes {
		Bytes::copy_from_slice(self.as_bytes())
	}
}

impl ToArg for String {
	fn to_arg(&self) -> Bytes {
		Bytes::copy_from_slice(self.as_bytes())
	}
}

impl ToArg for [u8] {
	fn to_arg(&self) -> Bytes {
		Bytes::copy_from_slice(self)
	}
}

impl<const N: usize> ToArg for [u8; N] {
	fn to_arg(&self) -> Bytes {
		Bytes::copy_from_slice(self)
	}
}

impl ToArg for Vec<u8> {
	fn to_arg(&self) -> Bytes {
		Bytes::copy_from_slice(self)
	}
}

impl ToArg for Bytes {
	fn to_arg(&self) -> Bytes {
		self.clone()
	}
}

impl<T: ToArg + ?Sized> ToArg for &T {
	fn to_arg(&self) -> Bytes {
		(**self).to_arg()
	}
}

macro_rules! impl_to_arg_display {
	($($ty:ty),* $(,)?) => {
		$(
			impl ToArg for $ty {
				fn to_arg(&self) -> Bytes {
					Bytes::from(self.to_string())
				}
			}
		)*
	};
}

impl_to_arg_display!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, char);

/// An ordered sequence of arguments, the first being the command name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Command {
	args: Vec<Bytes>,
}

impl Command {
	/// Start a command with its name
	pub fn new(name: impl ToArg) -> Self {
		Self {
			args: vec![name.to_arg()],
		}
	}

	/// Append an argument
	pub fn arg(mut self, arg: impl ToArg) -> Self {
		self.args.push(arg.to_arg());
		self
	}

	/// Append every argument of an iterator
	pub fn args<I>(mut self, args: I) -> Self
	where
		I: IntoIterator,
		I::Item: ToArg,
	{
		self.args.extend(args.into_iter().map(|a| a.to_arg()));
		self
	}

	/// Append an argument in place
	pub fn push_arg(&mut self, arg: impl ToArg) {
		self.args.push(arg.to_arg());
	}

	pub fn as_slice(&self) -> &[Bytes] {
		&self.args
	}

	/// The command name, if any argument was given
	pub fn name(&self) -> Option<&Bytes> {
		self.args.first()
	}

	/// Lossy command name for logging
	pub fn display_name(&self) -> String {
		self.name()
			.map(|n| String::from_utf8_lossy(n).to_uppercase())
			.unwrap_or_default()
	}

	pub fn len(&self) -> usize {
		self.args.len()
	}

	pub fn is_empty(&self) -> bool {
		self.args.is_empty()
	}
}

impl<T: ToArg> FromIterator<T> for Command {
	fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
		Self {
			args: iter.into_iter().map(|a| a.to_arg()).collect(),
		}
	}
}

/// Build a [`Command`] from a list of heterogeneous arguments.
///
/// ```
/// let cmd = resp::cmd!("set", "mykey", 123);
/// assert_eq!(cmd.len(), 3);
/// ```
#[macro_export]
macro_rules! cmd {
	($name:expr $(, $arg:expr)* $(,)?) => {
		$crate::Command::new($name)$(.arg($arg))*
	};
}
