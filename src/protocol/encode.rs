//! Protocol message encoding

use super::constants::{
    commands, fields, ADMIN_HEADER_SIZE, COMMAND_OFFSET, FIELD_COUNT_OFFSET, MSG_TYPE_ADMIN,
    MSG_VERSION, PROTO_HEADER_SIZE,
};
use super::message::AdminRequest;
use bytes::{BufMut, BytesMut};
use std::io;

/// Largest body size representable in the 48-bit proto header size field
const MAX_BODY_SIZE: u64 = (1 << 48) - 1;

/// Encode an admin request into a complete framed message
pub fn encode_request(msg: &AdminRequest) -> io::Result<BytesMut> {
    let mut buf = BytesMut::with_capacity(256);

    // Proto header placeholder, size filled at end
    buf.put_u64(0);

    match msg {
        AdminRequest::Login { user, credential } => {
            write_admin_header(&mut buf, commands::LOGIN, 2);
            write_field(&mut buf, fields::USER, user.as_bytes())?;
            write_field(&mut buf, fields::CREDENTIAL, credential.as_bytes())?;
        }
        AdminRequest::Authenticate {
            user,
            session_token,
        } => {
            write_admin_header(&mut buf, commands::AUTHENTICATE, 2);
            write_field(&mut buf, fields::USER, user.as_bytes())?;
            write_field(&mut buf, fields::SESSION_TOKEN, session_token)?;
        }
        AdminRequest::CreateUser {
            user,
            password_hash,
            roles,
        } => {
            write_admin_header(&mut buf, commands::CREATE_USER, 3);
            write_field(&mut buf, fields::USER, user.as_bytes())?;
            write_field(&mut buf, fields::PASSWORD, password_hash.as_bytes())?;
            write_roles(&mut buf, roles)?;
        }
        AdminRequest::DropUser { user } => {
            write_admin_header(&mut buf, commands::DROP_USER, 1);
            write_field(&mut buf, fields::USER, user.as_bytes())?;
        }
        AdminRequest::SetPassword {
            user,
            password_hash,
        } => {
            write_admin_header(&mut buf, commands::SET_PASSWORD, 2);
            write_field(&mut buf, fields::USER, user.as_bytes())?;
            write_field(&mut buf, fields::PASSWORD, password_hash.as_bytes())?;
        }
        AdminRequest::ChangePassword {
            user,
            old_password_hash,
            password_hash,
        } => {
            write_admin_header(&mut buf, commands::CHANGE_PASSWORD, 3);
            write_field(&mut buf, fields::USER, user.as_bytes())?;
            write_field(&mut buf, fields::OLD_PASSWORD, old_password_hash.as_bytes())?;
            write_field(&mut buf, fields::PASSWORD, password_hash.as_bytes())?;
        }
    }

    write_proto_header(&mut buf)?;
    Ok(buf)
}

/// Admin header is all zeros apart from the command and field count
fn write_admin_header(buf: &mut BytesMut, command: u8, field_count: u8) {
    let mut header = [0u8; ADMIN_HEADER_SIZE];
    header[COMMAND_OFFSET] = command;
    header[FIELD_COUNT_OFFSET] = field_count;
    buf.put_slice(&header);
}

fn write_field(buf: &mut BytesMut, id: u8, data: &[u8]) -> io::Result<()> {
    let len = u32::try_from(data.len() + 1).map_err(|_| {
        io::Error::new(io::ErrorKind::InvalidInput, "admin field too large")
    })?;
    buf.put_u32(len);
    buf.put_u8(id);
    buf.put_slice(data);
    Ok(())
}

/// Roles field: count byte, then each role as a length byte and its name
fn write_roles(buf: &mut BytesMut, roles: &[String]) -> io::Result<()> {
    let count = u8::try_from(roles.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "too many roles"))?;

    let mut data = BytesMut::new();
    data.put_u8(count);
    for role in roles {
        let len = u8::try_from(role.len()).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("role name too long: {}", role),
            )
        })?;
        data.put_u8(len);
        data.put_slice(role.as_bytes());
    }

    write_field(buf, fields::ROLES, &data)
}

/// Fill in the proto header: version, type, 48-bit body size
fn write_proto_header(buf: &mut BytesMut) -> io::Result<()> {
    let body = (buf.len() - PROTO_HEADER_SIZE) as u64;
    if body > MAX_BODY_SIZE {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "admin message too large",
        ));
    }

    let header =
        (u64::from(MSG_VERSION) << 56) | (u64::from(MSG_TYPE_ADMIN) << 48) | body;
    buf[..PROTO_HEADER_SIZE].copy_from_slice(&header.to_be_bytes());
    Ok(())
}
